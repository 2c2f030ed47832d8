//! # darm - command-line front end
//!
//! Reads raw little-endian machine code and writes address-prefixed
//! assembly lines through the `decoder` crate. The binary owns everything
//! the core deliberately does not: argument parsing, file framing and
//! ranges, instruction addresses, and the output sink.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use decoder::{ArmArch, ThumbSize, decode_arm, decode_thumb, not_recognized_count};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Disassemble a binary file.
    File {
        /// Binary file to read.
        input: PathBuf,
        /// Output file; stdout when omitted.
        output: Option<PathBuf>,
        /// Byte range to disassemble, in hex: START-END, START-- or --END.
        #[arg(long)]
        range: Option<String>,
        /// Instruction set to decode.
        #[arg(long, value_enum, default_value_t = Mode::Thumb)]
        mode: Mode,
        /// Architecture profile.
        #[arg(long, value_enum, default_value_t = Profile::V5te)]
        arch: Profile,
    },
    /// Render the entire 16-bit Thumb opcode space (decoder debugging aid).
    DumpThumb {
        /// Output file; stdout when omitted.
        output: Option<PathBuf>,
        /// Architecture profile.
        #[arg(long, value_enum, default_value_t = Profile::V5te)]
        arch: Profile,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Arm,
    Thumb,
}

#[derive(Clone, Copy, ValueEnum)]
enum Profile {
    V4t,
    V5te,
}

impl From<Profile> for ArmArch {
    fn from(profile: Profile) -> Self {
        match profile {
            Profile::V4t => Self::Armv4T,
            Profile::V5te => Self::Armv5Te,
        }
    }
}

/// Byte range within the input file. `end` of `None` runs to the end of
/// the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileRange {
    start: usize,
    end: Option<usize>,
}

impl FileRange {
    const WHOLE: Self = Self {
        start: 0,
        end: None,
    };

    /// Parse the hex forms `START-END`, `START--` and `--END`.
    fn parse(text: &str) -> Result<Self> {
        let (start, end) = if let Some(end) = text.strip_prefix("--") {
            ("", end)
        } else {
            text.split_once('-')
                .with_context(|| format!("range {text:?} has no dash"))?
        };
        let start = if start.is_empty() {
            0
        } else {
            usize::from_str_radix(start, 16)
                .with_context(|| format!("bad range start {start:?}"))?
        };
        let end = match end {
            "" | "-" => None,
            end => Some(
                usize::from_str_radix(end, 16).with_context(|| format!("bad range end {end:?}"))?,
            ),
        };
        // an end of zero means "to the end of the file"
        let end = end.filter(|&end| end != 0);
        if let Some(end) = end
            && start > end
        {
            tracing::warn!(
                "range start 0x{start:X} is past its end 0x{end:X}; disassembling the whole file"
            );
            return Ok(Self::WHOLE);
        }
        Ok(Self { start, end })
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    match Cli::parse().command {
        Command::File {
            input,
            output,
            range,
            mode,
            arch,
        } => {
            let range = range
                .as_deref()
                .map(FileRange::parse)
                .transpose()?
                .unwrap_or(FileRange::WHOLE);
            let bytes = fs::read(&input)
                .with_context(|| format!("reading {}", input.display()))?;
            tracing::info!("disassembling {}", input.display());
            with_sink(output.as_deref(), |out| {
                disassemble(&bytes, range, mode, arch.into(), out)
            })
        }
        Command::DumpThumb { output, arch } => {
            let before = not_recognized_count();
            with_sink(output.as_deref(), |out| dump_thumb(arch.into(), out))?;
            let missing = not_recognized_count() - before;
            eprintln!("{missing} of 65536 half-words not recognized.");
            Ok(())
        }
    }
}

fn with_sink(path: Option<&Path>, write: impl FnOnce(&mut dyn Write) -> Result<()>) -> Result<()> {
    match path {
        Some(path) => {
            let file = fs::File::create(path)
                .with_context(|| format!("creating {}", path.display()))?;
            let mut out = BufWriter::new(file);
            write(&mut out)?;
            out.flush()?;
            Ok(())
        }
        None => write(&mut io::stdout().lock()),
    }
}

fn disassemble(
    bytes: &[u8],
    range: FileRange,
    mode: Mode,
    arch: ArmArch,
    out: &mut dyn Write,
) -> Result<()> {
    if range.start > bytes.len() {
        bail!(
            "range starts at 0x{:X} but the file has only 0x{:X} bytes",
            range.start,
            bytes.len()
        );
    }
    let end = range.end.map_or(bytes.len(), |end| end.min(bytes.len()));
    let slice = &bytes[range.start..end];
    writeln!(out, "Disassembly of {} bytes:", slice.len())?;
    writeln!(out)?;
    match mode {
        Mode::Arm => disassemble_arm(slice, range.start, arch, out)?,
        Mode::Thumb => disassemble_thumb(slice, range.start, arch, out)?,
    }
    writeln!(out)?;
    writeln!(out, "{} unknown instructions.", not_recognized_count())?;
    Ok(())
}

fn disassemble_arm(bytes: &[u8], base: usize, arch: ArmArch, out: &mut dyn Write) -> io::Result<()> {
    for (i, chunk) in bytes.chunks_exact(4).enumerate() {
        let word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        writeln!(out, "{:08X}: {word:08X} {}", base + 4 * i, decode_arm(word, arch))?;
    }
    Ok(())
}

fn disassemble_thumb(
    bytes: &[u8],
    base: usize,
    arch: ArmArch,
    out: &mut dyn Write,
) -> io::Result<()> {
    let mut offset = 0;
    while offset + 2 <= bytes.len() {
        let window = read_window(bytes, offset);
        let (text, size) = decode_thumb(window, arch);
        match size {
            ThumbSize::Size32 => {
                writeln!(out, "{:08X}: {window:08X} {text}", base + offset)?;
                offset += 4;
            }
            ThumbSize::Size16 => {
                writeln!(out, "{:08X}: {:04X}     {text}", base + offset, window & 0xFFFF)?;
                offset += 2;
            }
        }
    }
    Ok(())
}

/// 32-bit little-endian window at `offset`, zero-padded past the end of
/// the buffer so a trailing BL prefix sees an invalid lookahead.
fn read_window(bytes: &[u8], offset: usize) -> u32 {
    let mut window = [0u8; 4];
    let available = (bytes.len() - offset).min(4);
    window[..available].copy_from_slice(&bytes[offset..offset + available]);
    u32::from_le_bytes(window)
}

fn dump_thumb(arch: ArmArch, out: &mut dyn Write) -> Result<()> {
    for code in 0..=0xFFFF_u32 {
        let (text, _) = decode_thumb(code, arch);
        writeln!(out, "{code:04X} {text}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_range_forms() {
        assert_eq!(
            FileRange::parse("1c-40").unwrap(),
            FileRange {
                start: 0x1C,
                end: Some(0x40)
            }
        );
        assert_eq!(
            FileRange::parse("--40").unwrap(),
            FileRange {
                start: 0,
                end: Some(0x40)
            }
        );
        assert_eq!(
            FileRange::parse("1c--").unwrap(),
            FileRange {
                start: 0x1C,
                end: None
            }
        );
    }

    #[test]
    fn parse_range_rejects_garbage() {
        assert!(FileRange::parse("").is_err());
        assert!(FileRange::parse("40").is_err());
        assert!(FileRange::parse("zz-40").is_err());
    }

    #[test]
    fn parse_range_falls_back_when_start_is_past_the_end() {
        assert_eq!(FileRange::parse("40-1c").unwrap(), FileRange::WHOLE);
    }

    #[test]
    fn parse_range_treats_a_zero_end_as_open() {
        assert_eq!(
            FileRange::parse("1c-0").unwrap(),
            FileRange {
                start: 0x1C,
                end: None
            }
        );
        assert_eq!(FileRange::parse("--0").unwrap(), FileRange::WHOLE);
    }

    #[test]
    fn thumb_walk_consumes_link_branches_whole() {
        // push {lr}; bl #0x4 (two half-words); bx lr
        let bytes = [0x00, 0xB5, 0x00, 0xF0, 0x00, 0xF8, 0x70, 0x47];
        let mut out = Vec::new();
        disassemble(
            &bytes,
            FileRange::WHOLE,
            Mode::Thumb,
            ArmArch::Armv5Te,
            &mut out,
        )
        .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Disassembly of 8 bytes:\n\n"));
        assert!(text.contains("00000000: B500     push {lr}\n"));
        assert!(text.contains("00000002: F800F000 bl #0x4\n"));
        assert!(text.contains("00000006: 4770     bx lr\n"));
    }

    #[test]
    fn arm_walk_reads_little_endian_words() {
        // mov r0, #0x1
        let bytes = [0x01, 0x00, 0xA0, 0xE3];
        let mut out = Vec::new();
        disassemble(
            &bytes,
            FileRange::WHOLE,
            Mode::Arm,
            ArmArch::Armv5Te,
            &mut out,
        )
        .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("00000000: E3A00001 mov r0, #0x1\n"));
    }

    #[test]
    fn range_clamps_to_file_length() {
        let bytes = [0x70, 0x47, 0x70, 0x47];
        let mut out = Vec::new();
        let range = FileRange {
            start: 2,
            end: Some(0x100),
        };
        disassemble(&bytes, range, Mode::Thumb, ArmArch::Armv5Te, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Disassembly of 2 bytes:"));
        assert!(text.contains("00000002: 4770     bx lr\n"));
    }
}
