use crate::PlyError;
use rangescan_core::{PointCloud, Sample, DEFAULT_UNITS};
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Body encoding of a PLY file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlyFormat {
    #[default]
    Ascii,
    BinaryLittleEndian,
}

impl PlyFormat {
    fn header_name(self) -> &'static str {
        match self {
            PlyFormat::Ascii => "ascii",
            PlyFormat::BinaryLittleEndian => "binary_little_endian",
        }
    }
}

/// Scalar property type as declared in the PLY header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PropType {
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Float32,
    Float64,
}

impl PropType {
    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "char" | "int8" => PropType::Int8,
            "uchar" | "uint8" => PropType::Uint8,
            "short" | "int16" => PropType::Int16,
            "ushort" | "uint16" => PropType::Uint16,
            "int" | "int32" => PropType::Int32,
            "uint" | "uint32" => PropType::Uint32,
            "float" | "float32" => PropType::Float32,
            "double" | "float64" => PropType::Float64,
            _ => return None,
        })
    }

    fn byte_size(self) -> usize {
        match self {
            PropType::Int8 | PropType::Uint8 => 1,
            PropType::Int16 | PropType::Uint16 => 2,
            PropType::Int32 | PropType::Uint32 | PropType::Float32 => 4,
            PropType::Float64 => 8,
        }
    }

    /// Decode one little-endian value; `bytes` holds exactly `byte_size()` bytes.
    fn decode_le(self, bytes: &[u8]) -> f64 {
        let mut buf = [0u8; 8];
        buf[..bytes.len()].copy_from_slice(bytes);
        match self {
            PropType::Int8 => i8::from_le_bytes([buf[0]]) as f64,
            PropType::Uint8 => buf[0] as f64,
            PropType::Int16 => i16::from_le_bytes([buf[0], buf[1]]) as f64,
            PropType::Uint16 => u16::from_le_bytes([buf[0], buf[1]]) as f64,
            PropType::Int32 => i32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) as f64,
            PropType::Uint32 => u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) as f64,
            PropType::Float32 => f32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) as f64,
            PropType::Float64 => f64::from_le_bytes(buf),
        }
    }
}

struct PlyHeader {
    format: PlyFormat,
    vertex_count: usize,
    properties: Vec<(String, PropType)>,
    units: Option<String>,
    body_offset: usize,
}

impl PlyHeader {
    fn column(&self, name: &str) -> Option<usize> {
        self.properties.iter().position(|(n, _)| n == name)
    }

    fn stride(&self) -> usize {
        self.properties.iter().map(|(_, t)| t.byte_size()).sum()
    }
}

fn parse_header(data: &[u8]) -> Result<PlyHeader, PlyError> {
    let (marker_at, body_offset) = find_end_header(data)?;

    let text = std::str::from_utf8(&data[..marker_at])
        .map_err(|_| PlyError::Header("header is not valid UTF-8".into()))?;
    let mut lines = text.lines().map(str::trim);

    if lines.next() != Some("ply") {
        return Err(PlyError::Header("file does not start with 'ply'".into()));
    }

    let mut format = None;
    let mut units = None;
    let mut vertex_count = None;
    let mut properties = Vec::new();
    let mut in_vertex = false;

    for line in lines {
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.as_slice() {
            [] => {}
            ["format", kind, ..] => {
                format = Some(match *kind {
                    "ascii" => PlyFormat::Ascii,
                    "binary_little_endian" => PlyFormat::BinaryLittleEndian,
                    other => return Err(PlyError::Unsupported(format!("format {other}"))),
                });
            }
            ["comment", rest @ ..] => {
                if let Some(value) = rest.first().and_then(|w| w.strip_prefix("units=")) {
                    units = Some(value.to_string());
                }
            }
            ["obj_info", ..] => {}
            ["element", "vertex", count] => {
                if vertex_count.is_some() {
                    return Err(PlyError::Header("duplicate vertex element".into()));
                }
                let count = count
                    .parse::<usize>()
                    .map_err(|e| PlyError::Header(format!("invalid vertex count: {e}")))?;
                vertex_count = Some(count);
                in_vertex = true;
            }
            ["element", name, ..] => {
                // Vertex records are read from the start of the body.
                if vertex_count.is_none() {
                    return Err(PlyError::Unsupported(format!(
                        "element `{name}` before vertex"
                    )));
                }
                in_vertex = false;
            }
            ["property", "list", ..] if in_vertex => {
                return Err(PlyError::Unsupported("list property on vertex".into()));
            }
            ["property", kind, name] if in_vertex => {
                let ty = PropType::parse(kind)
                    .ok_or_else(|| PlyError::Unsupported(format!("property type {kind}")))?;
                properties.push((name.to_string(), ty));
            }
            ["property", ..] => {}
            _ => return Err(PlyError::Header(format!("unrecognised line: {line}"))),
        }
    }

    Ok(PlyHeader {
        format: format.ok_or_else(|| PlyError::Header("format line missing".into()))?,
        vertex_count: vertex_count
            .ok_or_else(|| PlyError::Header("vertex element missing".into()))?,
        properties,
        units,
        body_offset,
    })
}

/// Locates the line that is exactly `end_header` (surrounding whitespace
/// allowed). Returns where that line starts and where the body begins.
fn find_end_header(data: &[u8]) -> Result<(usize, usize), PlyError> {
    let mut start = 0;
    while start < data.len() {
        let Some(len) = data[start..].iter().position(|&b| b == b'\n') else {
            break;
        };
        if data[start..start + len].trim_ascii() == b"end_header" {
            return Ok((start, start + len + 1));
        }
        start += len + 1;
    }
    if data[start..].trim_ascii() == b"end_header" {
        return Err(PlyError::Header("end_header is not followed by a newline".into()));
    }
    Err(PlyError::Header("missing end_header".into()))
}

/// Parses an in-memory PLY file into a cloud.
///
/// `x`, `y` and `z` are required. `distance` is read when present and is
/// 0.0 otherwise; every other property is skipped. The unit label comes from
/// a `comment units=<label>` header line, defaulting to meters.
pub fn parse_ply(data: &[u8]) -> Result<PointCloud, PlyError> {
    let header = parse_header(data)?;

    let (Some(ix), Some(iy), Some(iz)) = (
        header.column("x"),
        header.column("y"),
        header.column("z"),
    ) else {
        return Err(PlyError::Header("missing required x, y, z properties".into()));
    };
    let id = header.column("distance");

    let n = header.vertex_count;
    let body = &data[header.body_offset..];
    // Every vertex takes at least one byte, which bounds an untrusted count.
    let mut samples = Vec::with_capacity(n.min(body.len()));

    match header.format {
        PlyFormat::Ascii => {
            let body = std::str::from_utf8(body)
                .map_err(|_| PlyError::Body("ASCII body is not valid UTF-8".into()))?;
            let columns = header.properties.len();

            for (row, line) in body.lines().filter(|l| !l.trim().is_empty()).take(n).enumerate() {
                let fields: Vec<&str> = line.split_whitespace().collect();
                if fields.len() < columns {
                    return Err(PlyError::Body(format!(
                        "vertex {row} has {} fields, expected {columns}",
                        fields.len()
                    )));
                }
                let value = |col: usize| -> Result<f64, PlyError> {
                    fields[col].parse::<f64>().map_err(|e| {
                        PlyError::Body(format!("vertex {row}: bad number `{}`: {e}", fields[col]))
                    })
                };
                let distance = match id {
                    Some(col) => value(col)?,
                    None => 0.0,
                };
                samples.push(Sample::new(value(ix)?, value(iy)?, value(iz)?, distance));
            }

            if samples.len() < n {
                return Err(PlyError::Body(format!(
                    "expected {n} vertices, found {}",
                    samples.len()
                )));
            }
        }
        PlyFormat::BinaryLittleEndian => {
            let stride = header.stride();
            let needed = n
                .checked_mul(stride)
                .ok_or_else(|| PlyError::Header(format!("vertex count {n} is too large")))?;
            if body.len() < needed {
                return Err(PlyError::Body(format!(
                    "binary body too short: need {needed} bytes, got {}",
                    body.len()
                )));
            }

            let mut offsets = Vec::with_capacity(header.properties.len());
            let mut off = 0usize;
            for (_, ty) in &header.properties {
                offsets.push(off);
                off += ty.byte_size();
            }

            for record in body[..needed].chunks_exact(stride.max(1)).take(n) {
                let value = |col: usize| {
                    let ty = header.properties[col].1;
                    let start = offsets[col];
                    ty.decode_le(&record[start..start + ty.byte_size()])
                };
                let distance = match id {
                    Some(col) => value(col),
                    None => 0.0,
                };
                samples.push(Sample::new(value(ix), value(iy), value(iz), distance));
            }
        }
    }

    let mut cloud = PointCloud::with_units(header.units.unwrap_or_else(|| DEFAULT_UNITS.into()));
    cloud.extend(&samples)?;
    Ok(cloud)
}

pub fn read_ply(path: impl AsRef<Path>) -> Result<PointCloud, PlyError> {
    let path = path.as_ref();
    let data = fs::read(path)?;
    let cloud = parse_ply(&data)?;
    debug!(path = %path.display(), points = cloud.len(), "read PLY");
    Ok(cloud)
}

/// Serialises `cloud` as a PLY document with `x y z distance` doubles.
pub fn write_ply<W: Write>(w: &mut W, cloud: &PointCloud, format: PlyFormat) -> io::Result<()> {
    w.write_all(b"ply\n")?;
    writeln!(w, "format {} 1.0", format.header_name())?;
    writeln!(w, "comment units={}", cloud.units())?;
    writeln!(w, "element vertex {}", cloud.len())?;
    for name in ["x", "y", "z", "distance"] {
        writeln!(w, "property double {name}")?;
    }
    w.write_all(b"end_header\n")?;

    match format {
        PlyFormat::Ascii => {
            for s in cloud.iter_samples() {
                writeln!(w, "{} {} {} {}", s.x, s.y, s.z, s.distance)?;
            }
        }
        PlyFormat::BinaryLittleEndian => {
            for s in cloud.iter_samples() {
                for v in [s.x, s.y, s.z, s.distance] {
                    w.write_all(&v.to_le_bytes())?;
                }
            }
        }
    }

    w.flush()
}

/// The bytes [`write_ply`] would produce.
pub fn ply_bytes(cloud: &PointCloud, format: PlyFormat) -> Vec<u8> {
    let mut out = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = write_ply(&mut out, cloud, format);
    out
}

pub fn save_ply(
    path: impl AsRef<Path>,
    cloud: &PointCloud,
    format: PlyFormat,
) -> Result<(), PlyError> {
    let mut w = BufWriter::new(fs::File::create(path)?);
    write_ply(&mut w, cloud, format)?;
    Ok(())
}
