//! Default evidence source backed by the ELF symbol tables.
//!
//! Reads `.dynsym` and `.symtab` through the section header table. Defined
//! symbols are exports, undefined ones imports. Every offset taken from the
//! file is bounds-checked; malformed input yields an error or an empty list,
//! never a panic.

use std::path::Path;

use libprobe_core::errors::DetectionResult;
use libprobe_core::{DetectionError, FxHashSet};

use super::strings::extract_printable_strings;
use super::{BinaryEvidenceSource, SymbolTable};

const ELF_MAGIC: &[u8; 4] = b"\x7fELF";
const SHT_SYMTAB: u32 = 2;
const SHT_DYNSYM: u32 = 11;
const SHN_UNDEF: u16 = 0;
const STT_SECTION: u8 = 3;
const STT_FILE: u8 = 4;

/// Evidence from ELF shared objects on disk.
#[derive(Debug, Clone)]
pub struct ElfEvidenceSource {
    min_string_len: usize,
}

impl ElfEvidenceSource {
    pub fn new(min_string_len: usize) -> Self {
        Self {
            min_string_len: min_string_len.max(1),
        }
    }
}

impl Default for ElfEvidenceSource {
    fn default() -> Self {
        Self::new(4)
    }
}

impl BinaryEvidenceSource for ElfEvidenceSource {
    fn strings(&self, path: &Path) -> DetectionResult<Vec<String>> {
        let bytes = std::fs::read(path)?;
        if !bytes.starts_with(ELF_MAGIC) {
            return Err(DetectionError::evidence(
                path.display().to_string(),
                "missing ELF magic",
            ));
        }
        Ok(extract_printable_strings(&bytes, self.min_string_len))
    }

    fn symbols(&self, path: &Path) -> DetectionResult<SymbolTable> {
        let bytes = std::fs::read(path)?;
        parse_symbols(&bytes)
            .map_err(|message| DetectionError::evidence(path.display().to_string(), message))
    }
}

/// Extract exported/imported symbol names from an in-memory ELF image.
pub fn parse_symbols(bytes: &[u8]) -> Result<SymbolTable, String> {
    let elf = ElfView::parse(bytes)?;

    let mut exports = Vec::new();
    let mut imports = Vec::new();
    let mut seen_exports = FxHashSet::default();
    let mut seen_imports = FxHashSet::default();

    for section in elf.sections()? {
        if section.kind != SHT_DYNSYM && section.kind != SHT_SYMTAB {
            continue;
        }
        let strtab = match elf.section(section.link as usize)? {
            Some(s) => s,
            None => continue,
        };
        for sym in elf.symbols(&section)? {
            let sym_type = sym.info & 0x0f;
            if sym_type == STT_SECTION || sym_type == STT_FILE {
                continue;
            }
            let name = match elf.c_str(&strtab, sym.name) {
                Some(n) if !n.is_empty() => n,
                _ => continue,
            };
            if sym.shndx == SHN_UNDEF {
                if seen_imports.insert(name.clone()) {
                    imports.push(name);
                }
            } else if seen_exports.insert(name.clone()) {
                exports.push(name);
            }
        }
    }

    Ok(SymbolTable { exports, imports })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    Elf32,
    Elf64,
}

#[derive(Debug, Clone, Copy)]
struct Section {
    kind: u32,
    offset: u64,
    size: u64,
    link: u32,
    entsize: u64,
}

#[derive(Debug, Clone, Copy)]
struct Symbol {
    name: u32,
    info: u8,
    shndx: u16,
}

struct ElfView<'a> {
    bytes: &'a [u8],
    class: Class,
    little_endian: bool,
    shoff: u64,
    shentsize: u16,
    shnum: u16,
}

impl<'a> ElfView<'a> {
    fn parse(bytes: &'a [u8]) -> Result<Self, String> {
        if bytes.len() < 16 || &bytes[..4] != ELF_MAGIC {
            return Err("not an ELF file".into());
        }
        let class = match bytes[4] {
            1 => Class::Elf32,
            2 => Class::Elf64,
            other => return Err(format!("unsupported ELF class {other}")),
        };
        let little_endian = match bytes[5] {
            1 => true,
            2 => false,
            other => return Err(format!("unsupported ELF data encoding {other}")),
        };
        let mut view = Self {
            bytes,
            class,
            little_endian,
            shoff: 0,
            shentsize: 0,
            shnum: 0,
        };
        let (shoff, shentsize, shnum) = match class {
            Class::Elf64 => (view.u64_at(0x28)?, view.u16_at(0x3a)?, view.u16_at(0x3c)?),
            Class::Elf32 => (
                u64::from(view.u32_at(0x20)?),
                view.u16_at(0x2e)?,
                view.u16_at(0x30)?,
            ),
        };
        view.shoff = shoff;
        view.shentsize = shentsize;
        view.shnum = shnum;
        Ok(view)
    }

    fn sections(&self) -> Result<Vec<Section>, String> {
        // Stripped or header-less images simply have no symbol tables.
        if self.shoff == 0 || self.shnum == 0 {
            return Ok(Vec::new());
        }
        let mut sections = Vec::with_capacity(self.shnum as usize);
        for index in 0..self.shnum as usize {
            if let Some(section) = self.section(index)? {
                sections.push(section);
            }
        }
        Ok(sections)
    }

    fn section(&self, index: usize) -> Result<Option<Section>, String> {
        if index >= self.shnum as usize {
            return Ok(None);
        }
        let header_len: u64 = match self.class {
            Class::Elf64 => 64,
            Class::Elf32 => 40,
        };
        let base = (self.shentsize as u64)
            .checked_mul(index as u64)
            .and_then(|off| off.checked_add(self.shoff))
            .filter(|b| b.saturating_add(header_len) <= self.bytes.len() as u64)
            .ok_or_else(|| format!("section header {index} out of bounds"))?
            as usize;
        let section = match self.class {
            Class::Elf64 => Section {
                kind: self.u32_at(base + 4)?,
                offset: self.u64_at(base + 24)?,
                size: self.u64_at(base + 32)?,
                link: self.u32_at(base + 40)?,
                entsize: self.u64_at(base + 56)?,
            },
            Class::Elf32 => Section {
                kind: self.u32_at(base + 4)?,
                offset: u64::from(self.u32_at(base + 16)?),
                size: u64::from(self.u32_at(base + 20)?),
                link: self.u32_at(base + 24)?,
                entsize: u64::from(self.u32_at(base + 36)?),
            },
        };
        Ok(Some(section))
    }

    fn symbols(&self, section: &Section) -> Result<Vec<Symbol>, String> {
        let min_entsize = match self.class {
            Class::Elf64 => 24,
            Class::Elf32 => 16,
        };
        if section.entsize < min_entsize {
            return Ok(Vec::new());
        }
        let count = section.size / section.entsize;
        let mut symbols = Vec::new();
        for i in 0..count {
            let base = match i
                .checked_mul(section.entsize)
                .and_then(|off| off.checked_add(section.offset))
            {
                Some(b) if b.saturating_add(min_entsize) <= self.bytes.len() as u64 => {
                    b as usize
                }
                _ => break,
            };
            let symbol = match self.class {
                Class::Elf64 => Symbol {
                    name: self.u32_at(base)?,
                    info: self.u8_at(base + 4)?,
                    shndx: self.u16_at(base + 6)?,
                },
                Class::Elf32 => Symbol {
                    name: self.u32_at(base)?,
                    info: self.u8_at(base + 12)?,
                    shndx: self.u16_at(base + 14)?,
                },
            };
            symbols.push(symbol);
        }
        Ok(symbols)
    }

    fn c_str(&self, strtab: &Section, offset: u32) -> Option<String> {
        let table_end = strtab.offset.checked_add(strtab.size)?.min(self.bytes.len() as u64);
        let start = strtab.offset.checked_add(u64::from(offset))?;
        if start >= table_end {
            return None;
        }
        let slice = &self.bytes[start as usize..table_end as usize];
        let end = slice.iter().position(|&b| b == 0)?;
        std::str::from_utf8(&slice[..end]).ok().map(str::to_string)
    }

    fn slice(&self, offset: usize, len: usize) -> Result<&'a [u8], String> {
        offset
            .checked_add(len)
            .and_then(|end| self.bytes.get(offset..end))
            .ok_or_else(|| format!("truncated ELF: read of {len} bytes at {offset:#x}"))
    }

    fn u8_at(&self, offset: usize) -> Result<u8, String> {
        Ok(self.slice(offset, 1)?[0])
    }

    fn u16_at(&self, offset: usize) -> Result<u16, String> {
        let mut buf = [0u8; 2];
        buf.copy_from_slice(self.slice(offset, 2)?);
        Ok(if self.little_endian {
            u16::from_le_bytes(buf)
        } else {
            u16::from_be_bytes(buf)
        })
    }

    fn u32_at(&self, offset: usize) -> Result<u32, String> {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(self.slice(offset, 4)?);
        Ok(if self.little_endian {
            u32::from_le_bytes(buf)
        } else {
            u32::from_be_bytes(buf)
        })
    }

    fn u64_at(&self, offset: usize) -> Result<u64, String> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.slice(offset, 8)?);
        Ok(if self.little_endian {
            u64::from_le_bytes(buf)
        } else {
            u64::from_be_bytes(buf)
        })
    }
}
