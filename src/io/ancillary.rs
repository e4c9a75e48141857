use crate::types::{RayleighError, RayleighResult};
use regex::Regex;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Token counts of the logical records in legacy coefficient files
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RecordLayout {
    /// Buffer lengths dropped as header/separator records
    pub discard_lengths: Vec<usize>,
    /// Buffer lengths written out as one record
    pub record_lengths: Vec<usize>,
}

impl Default for RecordLayout {
    fn default() -> Self {
        Self {
            discard_lengths: vec![3],
            record_lengths: vec![19, 37],
        }
    }
}

impl RecordLayout {
    /// Load a layout from JSON; absent keys keep their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> RayleighResult<Self> {
        let reader = BufReader::new(File::open(path)?);
        let layout: RecordLayout = serde_json::from_reader(reader)?;
        Ok(layout)
    }
}

/// Counters from one reformatting pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReformatStats {
    pub lines_read: usize,
    pub records_written: usize,
    pub records_discarded: usize,
    /// Tokens still buffered at end of input; these are not written
    pub trailing_tokens: usize,
}

/// Instruments with legacy rayleigh coefficient tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instrument {
    Abi,
    Ami,
    Fci,
}

impl Instrument {
    pub const ALL: [Instrument; 3] = [Instrument::Abi, Instrument::Ami, Instrument::Fci];

    pub fn coefficient_set(&self) -> CoefficientSet {
        match self {
            Instrument::Abi => CoefficientSet {
                instrument: "ABI",
                platform: "GOESR",
                channels: &["ch01", "ch02", "ch03"],
                input_suffix: "",
            },
            Instrument::Ami => CoefficientSet {
                instrument: "AMI",
                platform: "GEOKOMPSAT-2A",
                channels: &["ch01", "ch02", "ch03", "ch04"],
                input_suffix: "",
            },
            Instrument::Fci => CoefficientSet {
                instrument: "FCI",
                platform: "MTG1",
                channels: &["ch01", "ch02", "ch03", "ch04"],
                input_suffix: "_v1",
            },
        }
    }
}

impl FromStr for Instrument {
    type Err = RayleighError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "abi" => Ok(Instrument::Abi),
            "ami" => Ok(Instrument::Ami),
            "fci" => Ok(Instrument::Fci),
            _ => Err(RayleighError::InvalidFormat(format!(
                "Unknown coefficient instrument {}, expected one of abi, ami, fci",
                s
            ))),
        }
    }
}

/// Naming of one instrument's coefficient files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoefficientSet {
    pub instrument: &'static str,
    pub platform: &'static str,
    pub channels: &'static [&'static str],
    pub input_suffix: &'static str,
}

impl CoefficientSet {
    pub fn input_name(&self, channel: &str) -> String {
        format!(
            "{}_{}_rayleigh_{}{}.dat",
            self.instrument, self.platform, channel, self.input_suffix
        )
    }

    pub fn output_name(&self, channel: &str) -> String {
        output_name(self.instrument, self.platform, channel)
    }
}

fn output_name(instrument: &str, platform: &str, channel: &str) -> String {
    format!("{}_{}_rayleigh_{}_GeoIPS.dat", instrument, platform, channel)
}

/// Legacy coefficient file found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoefficientFile {
    pub input: PathBuf,
    pub output: PathBuf,
    pub instrument: String,
    pub platform: String,
    pub channel: String,
}

/// Input/output pair written by a reformatting pass
#[derive(Debug, Clone)]
pub struct ReformattedFile {
    pub input: PathBuf,
    pub output: PathBuf,
    pub stats: ReformatStats,
}

/// Rewrites legacy multi-line coefficient records as one record per line
#[derive(Debug, Clone, Default)]
pub struct CoefficientReformatter {
    layout: RecordLayout,
}

impl CoefficientReformatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layout(layout: RecordLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &RecordLayout {
        &self.layout
    }

    /// Stream `reader` into `writer`. Tokens accumulate line by line; after
    /// each line the buffer is dropped or flushed if its length matches the
    /// layout exactly.
    pub fn reformat<R: BufRead, W: Write>(&self, reader: R, mut writer: W) -> RayleighResult<ReformatStats> {
        let mut stats = ReformatStats::default();
        let mut buffer: Vec<String> = Vec::new();

        for line in reader.lines() {
            let line = line?;
            stats.lines_read += 1;
            buffer.extend(line.split_whitespace().map(str::to_string));

            if self.layout.discard_lengths.contains(&buffer.len()) {
                stats.records_discarded += 1;
                buffer.clear();
            } else if self.layout.record_lengths.contains(&buffer.len()) {
                writeln!(writer, "{}", buffer.join(" "))?;
                stats.records_written += 1;
                buffer.clear();
            }
        }
        writer.flush()?;

        stats.trailing_tokens = buffer.len();
        if !buffer.is_empty() {
            log::warn!(
                "{} tokens left unflushed at end of input (first: {})",
                buffer.len(),
                buffer[0]
            );
        }

        Ok(stats)
    }

    pub fn reformat_file<P: AsRef<Path>, Q: AsRef<Path>>(&self, input: P, output: Q) -> RayleighResult<ReformatStats> {
        let input = input.as_ref();
        let output = output.as_ref();
        log::info!("Reformatting {} -> {}", input.display(), output.display());

        let reader = BufReader::new(File::open(input)?);
        let writer = BufWriter::new(File::create(output)?);
        let stats = self.reformat(reader, writer)?;

        log::debug!(
            "{}: {} lines, {} records written, {} discarded",
            input.display(),
            stats.lines_read,
            stats.records_written,
            stats.records_discarded
        );
        Ok(stats)
    }

    /// Reformat every channel file of `set` found in `directory`
    pub fn reformat_set<P: AsRef<Path>>(&self, directory: P, set: &CoefficientSet) -> RayleighResult<Vec<ReformattedFile>> {
        let directory = directory.as_ref();
        let mut written = Vec::with_capacity(set.channels.len());

        for channel in set.channels {
            let input = directory.join(set.input_name(channel));
            let output = directory.join(set.output_name(channel));
            let stats = self.reformat_file(&input, &output)?;
            written.push(ReformattedFile { input, output, stats });
        }

        Ok(written)
    }

    pub fn reformat_discovered(&self, files: &[CoefficientFile]) -> RayleighResult<Vec<ReformattedFile>> {
        files
            .iter()
            .map(|file| {
                let stats = self.reformat_file(&file.input, &file.output)?;
                Ok(ReformattedFile {
                    input: file.input.clone(),
                    output: file.output.clone(),
                    stats,
                })
            })
            .collect()
    }
}

fn coefficient_file_pattern() -> RayleighResult<Regex> {
    Regex::new(r"^(?P<instrument>[A-Z]+)_(?P<platform>.+)_rayleigh_(?P<channel>ch\d{2})(?:_v\d+)?\.dat$")
        .map_err(|e| RayleighError::InvalidFormat(format!("Invalid coefficient file pattern: {}", e)))
}

/// Find legacy coefficient files in `directory`, skipping already reformatted ones.
/// Results are sorted by file name.
pub fn discover_coefficient_files<P: AsRef<Path>>(directory: P) -> RayleighResult<Vec<CoefficientFile>> {
    let directory = directory.as_ref();
    let pattern = coefficient_file_pattern()?;
    let mut found = Vec::new();

    for entry in std::fs::read_dir(directory)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        if name.ends_with("_GeoIPS.dat") {
            continue;
        }
        if let Some(caps) = pattern.captures(name) {
            let instrument = caps["instrument"].to_string();
            let platform = caps["platform"].to_string();
            let channel = caps["channel"].to_string();
            found.push(CoefficientFile {
                input: entry.path(),
                output: directory.join(output_name(&instrument, &platform, &channel)),
                instrument,
                platform,
                channel,
            });
        }
    }

    found.sort_by(|a, b| a.input.cmp(&b.input));
    log::debug!("Discovered {} coefficient files in {}", found.len(), directory.display());
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(prefix: &str, count: usize) -> Vec<String> {
        (0..count).map(|i| format!("{}{}", prefix, i)).collect()
    }

    #[test]
    fn test_record_runs() {
        let mut input = String::new();
        input.push_str("ABI 1 0\n");
        let run19 = tokens("a", 19);
        input.push_str(&run19[..10].join(" "));
        input.push('\n');
        input.push_str(&run19[10..].join("  "));
        input.push('\n');
        let run37 = tokens("b", 37);
        for chunk in run37.chunks(8) {
            input.push_str(&chunk.join("\t"));
            input.push('\n');
        }

        let mut output = Vec::new();
        let stats = CoefficientReformatter::new()
            .reformat(input.as_bytes(), &mut output)
            .unwrap();

        let text = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], run19.join(" "));
        assert_eq!(lines[1], run37.join(" "));
        assert_eq!(stats.records_written, 2);
        assert_eq!(stats.records_discarded, 1);
        assert_eq!(stats.trailing_tokens, 0);
    }

    #[test]
    fn test_overshoot_keeps_accumulating() {
        // 18 + 2 tokens steps over 19, 20 + 17 lands on 37
        let mut input = tokens("x", 18).join(" ");
        input.push('\n');
        input.push_str("y z\n");
        input.push_str(&tokens("w", 17).join(" "));
        input.push('\n');

        let mut output = Vec::new();
        let stats = CoefficientReformatter::new()
            .reformat(input.as_bytes(), &mut output)
            .unwrap();

        assert_eq!(stats.records_written, 1);
        let text = String::from_utf8(output).unwrap();
        assert_eq!(text.split_whitespace().count(), 37);
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_trailing_tokens_dropped() {
        let mut output = Vec::new();
        let stats = CoefficientReformatter::new()
            .reformat("1 2 3 4 5\n\n".as_bytes(), &mut output)
            .unwrap();
        assert!(output.is_empty());
        assert_eq!(stats.lines_read, 2);
        assert_eq!(stats.trailing_tokens, 5);
    }

    #[test]
    fn test_custom_layout() {
        let layout = RecordLayout {
            discard_lengths: vec![1],
            record_lengths: vec![2],
        };
        let mut output = Vec::new();
        CoefficientReformatter::with_layout(layout)
            .reformat("h\n1\n2\n".as_bytes(), &mut output)
            .unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "");

        let mut output = Vec::new();
        CoefficientReformatter::with_layout(RecordLayout {
            discard_lengths: vec![],
            record_lengths: vec![2],
        })
        .reformat("1\n2\n".as_bytes(), &mut output)
        .unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "1 2\n");
    }

    #[test]
    fn test_coefficient_file_pattern() {
        let pattern = coefficient_file_pattern().unwrap();

        let caps = pattern.captures("FCI_MTG1_rayleigh_ch03_v1.dat").unwrap();
        assert_eq!(&caps["instrument"], "FCI");
        assert_eq!(&caps["platform"], "MTG1");
        assert_eq!(&caps["channel"], "ch03");

        let caps = pattern.captures("AMI_GEOKOMPSAT-2A_rayleigh_ch04.dat").unwrap();
        assert_eq!(&caps["platform"], "GEOKOMPSAT-2A");

        assert!(pattern.captures("abi_goesr_rayleigh_ch01.dat").is_none());
        assert!(pattern.captures("ABI_GOESR_rayleigh_ch1.dat").is_none());
    }

    #[test]
    fn test_layout_from_file() {
        let dir = tempfile::tempdir().unwrap();

        let path = dir.path().join("layout.json");
        std::fs::write(&path, r#"{ "record_lengths": [7, 13] }"#).unwrap();
        let layout = RecordLayout::from_file(&path).unwrap();
        assert_eq!(layout.record_lengths, vec![7, 13]);
        assert_eq!(layout.discard_lengths, vec![3]);

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "record_lengths = [7]").unwrap();
        assert!(matches!(RecordLayout::from_file(&bad), Err(RayleighError::Json(_))));
    }

    #[test]
    fn test_coefficient_set_names() {
        let abi = Instrument::Abi.coefficient_set();
        assert_eq!(abi.input_name("ch01"), "ABI_GOESR_rayleigh_ch01.dat");
        assert_eq!(abi.output_name("ch01"), "ABI_GOESR_rayleigh_ch01_GeoIPS.dat");

        let ami = Instrument::Ami.coefficient_set();
        assert_eq!(ami.channels.len(), 4);
        assert_eq!(ami.input_name("ch04"), "AMI_GEOKOMPSAT-2A_rayleigh_ch04.dat");

        let fci = Instrument::Fci.coefficient_set();
        assert_eq!(fci.input_name("ch02"), "FCI_MTG1_rayleigh_ch02_v1.dat");
        assert_eq!(fci.output_name("ch02"), "FCI_MTG1_rayleigh_ch02_GeoIPS.dat");

        assert_eq!("FCI".parse::<Instrument>().unwrap(), Instrument::Fci);
        assert!("seviri".parse::<Instrument>().is_err());
    }
}
