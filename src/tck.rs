//! Functions for reading and writing streamlines in MRtrix 'tck' track files.
//!
//! A tck file starts with a text header: the line `mrtrix tracks`, followed by `key: value` lines, terminated by a
//! line `END`. The `file: . <offset>` entry gives the byte offset of the binary data part, the `datatype` entry its
//! number format. The data part is a stream of xyz point triplets in world coordinates. A triplet of NaN values ends a
//! streamline, a triplet of Inf values ends the file.

use byteordered::{ByteOrdered, Endianness};
use flate2::bufread::GzDecoder;
use tracing::debug;

use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;

use nalgebra::Point3;

use crate::error::{Result, TractshapeError};
use crate::tract::{Streamline, Tract};
use crate::util::{is_gz_file, read_newline_terminated_string};

pub const TCK_MAGIC_LINE: &str = "mrtrix tracks";
pub const TCK_END_LINE: &str = "END";

/// Header keys which are derived from the data when writing, and thus never copied over.
const TCK_GENERATED_KEYS: [&str; 3] = ["datatype", "file", "count"];


/// The number formats allowed for the data part of a tck file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TckDatatype {
    Float32LE,
    Float32BE,
    Float64LE,
    Float64BE,
}

impl TckDatatype {

    pub fn from_name(name: &str) -> Result<TckDatatype> {
        match name {
            "Float32LE" => Ok(TckDatatype::Float32LE),
            "Float32BE" => Ok(TckDatatype::Float32BE),
            "Float64LE" => Ok(TckDatatype::Float64LE),
            "Float64BE" => Ok(TckDatatype::Float64BE),
            _ => Err(TractshapeError::UnsupportedTckDatatype(name.to_string())),
        }
    }

    pub fn endianness(&self) -> Endianness {
        match self {
            TckDatatype::Float32LE | TckDatatype::Float64LE => Endianness::Little,
            TckDatatype::Float32BE | TckDatatype::Float64BE => Endianness::Big,
        }
    }

    pub fn is_double(&self) -> bool {
        matches!(self, TckDatatype::Float64LE | TckDatatype::Float64BE)
    }
}

impl fmt::Display for TckDatatype {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            TckDatatype::Float32LE => "Float32LE",
            TckDatatype::Float32BE => "Float32BE",
            TckDatatype::Float64LE => "Float64LE",
            TckDatatype::Float64BE => "Float64BE",
        };
        write!(f, "{}", name)
    }
}


/// Models the text header of an MRtrix tck file.
#[derive(Debug, Clone, PartialEq)]
pub struct TckHeader {
    pub fields: Vec<(String, String)>, // All key/value pairs in file order, keys may repeat (e.g. 'command_history').
    pub datatype: TckDatatype,
    pub data_offset: usize,
    pub header_size: usize, // Bytes up to and including the END line.
}

impl Default for TckHeader {
    fn default() -> TckHeader {
        TckHeader {
            fields: Vec::new(),
            datatype: TckDatatype::Float32LE,
            data_offset: 0,
            header_size: 0,
        }
    }
}

impl TckHeader {

    /// Read a tck header from a file.
    /// If the file's name ends with ".gz", the file is assumed to need GZip decoding.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<TckHeader> {
        let gz = is_gz_file(&path);
        let file = BufReader::new(File::open(path)?);
        if gz {
            TckHeader::from_reader(&mut GzDecoder::new(file))
        } else {
            let mut file = file;
            TckHeader::from_reader(&mut file)
        }
    }


    /// Read a tck header from the given byte stream.
    /// It is assumed that the input is currently at the start of the file. On success, the input is positioned
    /// directly after the END line.
    pub fn from_reader<S>(input: &mut S) -> Result<TckHeader>
    where
        S: Read,
    {
        let mut hdr = TckHeader::default();

        let (magic, mut consumed) = read_newline_terminated_string(input)?;
        if magic != TCK_MAGIC_LINE {
            return Err(TractshapeError::InvalidTckFormat(format!("expected first line '{}', found '{}'", TCK_MAGIC_LINE, magic)));
        }

        let mut datatype: Option<TckDatatype> = None;
        let mut data_offset: Option<usize> = None;
        loop {
            let (line, n) = read_newline_terminated_string(input).map_err(|_| {
                TractshapeError::InvalidTckFormat(String::from("header is not terminated by an END line"))
            })?;
            consumed += n;

            if line.trim() == TCK_END_LINE {
                break;
            }
            if line.trim().is_empty() {
                continue;
            }

            let (key, value) = match line.split_once(':') {
                Some((key, value)) => (key.trim().to_string(), value.trim().to_string()),
                None => return Err(TractshapeError::InvalidTckFormat(format!("malformed header line '{}'", line))),
            };

            match key.as_str() {
                "datatype" => datatype = Some(TckDatatype::from_name(&value)?),
                "file" => data_offset = Some(parse_file_offset(&value)?),
                _ => {}
            }
            hdr.fields.push((key, value));
        }

        hdr.datatype = datatype.ok_or_else(|| TractshapeError::InvalidTckFormat(String::from("missing 'datatype' entry")))?;
        hdr.data_offset = data_offset.ok_or_else(|| TractshapeError::InvalidTckFormat(String::from("missing 'file' entry")))?;
        hdr.header_size = consumed;

        if hdr.data_offset < hdr.header_size {
            return Err(TractshapeError::InvalidTckFormat(format!(
                "data offset {} points into the header of {} bytes", hdr.data_offset, hdr.header_size)));
        }
        Ok(hdr)
    }


    /// The first value stored for the given key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }


    /// The number of streamlines according to the 'count' entry, if present and valid.
    pub fn count(&self) -> Option<usize> {
        self.get("count").and_then(|c| c.trim().parse::<usize>().ok())
    }


    /// Render the header text for a file holding `count` streamlines in Float32LE format.
    /// The offset in the 'file' entry is chosen so that the data starts directly after the END line.
    fn render(&self, count: usize) -> String {
        let mut text = format!("{}\n", TCK_MAGIC_LINE);
        for (key, value) in self.fields.iter().filter(|(k, _)| !TCK_GENERATED_KEYS.contains(&k.as_str())) {
            text.push_str(&format!("{}: {}\n", key, value));
        }
        text.push_str(&format!("datatype: {}\n", TckDatatype::Float32LE));
        text.push_str(&format!("count: {}\n", count));

        let mut offset = text.len();
        loop {
            let candidate = text.len() + format!("file: . {}\n{}\n", offset, TCK_END_LINE).len();
            if candidate == offset {
                break;
            }
            offset = candidate;
        }
        text.push_str(&format!("file: . {}\n{}\n", offset, TCK_END_LINE));
        text
    }
}


/// Parse the value of the 'file' header entry, which must refer to the same file: `. <offset>`.
fn parse_file_offset(value: &str) -> Result<usize> {
    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("."), Some(offset)) => offset
            .parse::<usize>()
            .map_err(|_| TractshapeError::InvalidTckFormat(format!("invalid data offset '{}'", offset))),
        _ => Err(TractshapeError::InvalidTckFormat(format!("unsupported 'file' entry '{}', data must be stored in the same file", value))),
    }
}


/// A tck file: the header and the tract stored in it.
#[derive(Debug, Clone, PartialEq)]
pub struct TckFile {
    pub header: TckHeader,
    pub tract: Tract,
}


/// Read a tck file.
pub fn read_tck<P: AsRef<Path>>(path: P) -> Result<TckFile> {
    TckFile::from_file(path)
}


/// Write a tract to a tck file in Float32LE format. Header fields other than 'datatype', 'file' and 'count' are
/// copied from the given header, if any.
pub fn write_tck<P: AsRef<Path>>(path: P, tract: &Tract, header: Option<&TckHeader>) -> Result<()> {
    let file = BufWriter::new(File::create(path)?);
    TckFile::write_to(file, tract, header)
}


impl TckFile {

    /// Read a tck file. If the file's name ends with ".gz", the file is assumed to need GZip decoding.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<TckFile> {
        let gz = is_gz_file(&path);
        let file = BufReader::new(File::open(path)?);
        if gz {
            TckFile::from_reader(GzDecoder::new(file))
        } else {
            TckFile::from_reader(file)
        }
    }


    /// Read a tck file from the given byte stream, which must be at the start of the file.
    pub fn from_reader<S>(mut input: S) -> Result<TckFile>
    where
        S: Read,
    {
        let hdr = TckHeader::from_reader(&mut input)?;

        // Skip any padding between header and data. This is read instead of seeking because we cannot seek in a GZ stream.
        let padding = (hdr.data_offset - hdr.header_size) as u64;
        let skipped = std::io::copy(&mut (&mut input).take(padding), &mut std::io::sink())?;
        if skipped != padding {
            return Err(TractshapeError::InvalidTckFormat(String::from("file ends before the data offset")));
        }

        let tract = read_streamlines(input, hdr.datatype)?;
        debug!("Read {} streamlines with {} points in total.", tract.num_streamlines(), tract.num_points());

        if let Some(count) = hdr.count() {
            if count != tract.num_streamlines() {
                debug!("Header 'count' is {} but the data holds {} streamlines.", count, tract.num_streamlines());
            }
        }

        Ok(TckFile { header: hdr, tract })
    }


    /// Write a tract in tck format to the given output.
    pub fn write_to<W>(output: W, tract: &Tract, header: Option<&TckHeader>) -> Result<()>
    where
        W: Write,
    {
        let default_header = TckHeader::default();
        let header = header.unwrap_or(&default_header);

        let mut output = output;
        output.write_all(header.render(tract.num_streamlines()).as_bytes())?;

        let mut output = ByteOrdered::le(output);

        for streamline in tract.iter() {
            for p in streamline.points.iter() {
                output.write_f32(p.x as f32)?;
                output.write_f32(p.y as f32)?;
                output.write_f32(p.z as f32)?;
            }
            for _ in 0..3 { output.write_f32(f32::NAN)?; }
        }
        for _ in 0..3 { output.write_f32(f32::INFINITY)?; }
        output.into_inner().flush()?;
        Ok(())
    }
}


/// Read the point triplets of the data part until the Inf triplet or the end of the input.
fn read_streamlines<S>(input: S, datatype: TckDatatype) -> Result<Tract>
where
    S: Read,
{
    let mut input = ByteOrdered::runtime(input, datatype.endianness());
    let mut read_value = move || -> std::io::Result<f64> {
        if datatype.is_double() { input.read_f64() } else { input.read_f32().map(f64::from) }
    };

    let mut streamlines: Vec<Streamline> = Vec::new();
    let mut current: Vec<Point3<f64>> = Vec::new();
    loop {
        let x = match read_value() {
            Ok(v) => v,
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        };
        let truncated = |_| TractshapeError::InvalidTckFormat(String::from("data ends within a point triplet"));
        let y = read_value().map_err(truncated)?;
        let z = read_value().map_err(truncated)?;

        if x.is_infinite() && y.is_infinite() && z.is_infinite() {
            break;
        }
        if x.is_nan() && y.is_nan() && z.is_nan() {
            streamlines.push(Streamline::new(std::mem::take(&mut current)));
            continue;
        }
        current.push(Point3::new(x, y, z));
    }

    if !current.is_empty() {
        streamlines.push(Streamline::new(current));
    }
    Ok(Tract::new(streamlines))
}
