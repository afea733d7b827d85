//! Utility functions used in all other tractshape modules.

use std::path::Path;
use std::io::Read;

use crate::error::Result;

use byteordered::byteorder::ReadBytesExt;

/// Check whether the file extension ends with ".gz".
pub fn is_gz_file<P>(path: P) -> bool
where
    P: AsRef<Path>,
{
    path.as_ref()
        .file_name()
        .map(|a| a.to_string_lossy().ends_with(".gz"))
        .unwrap_or(false)
}


/// Read a '\n'-terminated line from the input. The trailing '\n' is consumed but not added to the returned String,
/// a trailing '\r' is dropped as well. Returns the line and the number of bytes consumed.
pub fn read_newline_terminated_string<S>(input: &mut S) -> Result<(String, usize)>
where
    S: Read,
{
    let mut line: Vec<u8> = Vec::new();
    let mut consumed = 0;
    loop {
        let cur_byte = input.read_u8()?;
        consumed += 1;
        if cur_byte == b'\n' {
            break;
        }
        line.push(cur_byte);
    }
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    Ok((String::from_utf8_lossy(&line).into_owned(), consumed))
}


/// Arithmetic mean of the values, `None` for an empty input.
pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}


/// Rewrite the exponent of a number formatted with `{:e}` ("1.5e-5") to the C form, with a sign and at least two
/// digits ("1.5e-05").
fn c_style_exponent(formatted: &str) -> String {
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(d) => ('-', d),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => formatted.to_string(),
    }
}


/// The shortest representation of a float that reads back to the same value, e.g., `7.0`, `0.25`. Values below 1e-4
/// or from 1e16 on are written in exponent form, `1e-05`, `1.5e+16`.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return String::from("nan");
    }
    if value.is_infinite() {
        return String::from(if value > 0.0 { "inf" } else { "-inf" });
    }
    let magnitude = value.abs();
    if magnitude != 0.0 && (magnitude < 1e-4 || magnitude >= 1e16) {
        c_style_exponent(&format!("{:e}", value))
    } else {
        format!("{:?}", value)
    }
}


/// A float in exponent form with a fixed number of decimals, e.g., `2.50e+00` for 2 decimals.
pub fn format_scientific(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return format_float(value);
    }
    c_style_exponent(&format!("{:.*e}", decimals, value))
}


#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn gz_files_are_detected_by_extension() {
        assert!(is_gz_file("bundle.tck.gz"));
        assert!(!is_gz_file("bundle.tck"));
        assert!(!is_gz_file("/"));
    }

    #[test]
    fn lines_are_read_without_terminator() {
        let mut input = Cursor::new(b"mrtrix tracks\r\nEND\n".to_vec());
        let (first, n1) = read_newline_terminated_string(&mut input).unwrap();
        let (second, n2) = read_newline_terminated_string(&mut input).unwrap();
        assert_eq!("mrtrix tracks", first);
        assert_eq!(15, n1);
        assert_eq!("END", second);
        assert_eq!(4, n2);
    }

    #[test]
    fn a_missing_line_terminator_is_an_error() {
        let mut input = Cursor::new(b"END".to_vec());
        assert!(read_newline_terminated_string(&mut input).is_err());
    }

    #[test]
    fn the_mean_of_nothing_is_none() {
        assert_eq!(None, mean(Vec::new()));
        assert_eq!(Some(2.0), mean(vec![1.0, 2.0, 3.0]));
    }

    #[test]
    fn floats_are_formatted_with_c_style_exponents() {
        assert_eq!("7.0", format_float(7.0));
        assert_eq!("0.0001", format_float(0.0001));
        assert_eq!("1e-05", format_float(0.00001));
        assert_eq!("-2.5e-07", format_float(-2.5e-7));
        assert_eq!("1e+16", format_float(1e16));
        assert_eq!("1000000000000000.0", format_float(1e15));
        assert_eq!("1.2345e+100", format_float(1.2345e100));
        assert_eq!("nan", format_float(f64::NAN));
    }

    #[test]
    fn scientific_notation_has_a_fixed_number_of_decimals() {
        assert_eq!("1.000000000000000000e+00", format_scientific(1.0, 18));
        assert_eq!("2.50e-03", format_scientific(0.0025, 2));
        assert_eq!("-1.5e+120", format_scientific(-1.5e120, 1));
        assert_eq!("0.0e+00", format_scientific(0.0, 1));
    }
}
