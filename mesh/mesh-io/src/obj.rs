//! Wavefront OBJ support (vertex and face records only).
//!
//! The writer emits exactly one header comment line, then one `v x y z`
//! line per vertex and one `f a b c` line per face. OBJ indices are 1-based;
//! the translation happens here and nowhere else, so [`IndexedMesh`] keeps
//! 0-based indices throughout the pipeline.
//!
//! Coordinates are written with Rust's shortest round-trip float formatting,
//! so parsing the output reproduces every position bit for bit.
//!
//! # Example
//!
//! ```
//! use mesh_io::{parse_obj, to_obj_string};
//! use mesh_types::{IndexedMesh, Vertex};
//!
//! let mut mesh = IndexedMesh::new();
//! mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
//! mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
//! mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
//! mesh.faces.push([0, 1, 2]);
//!
//! let text = to_obj_string(&mesh);
//! assert!(text.lines().any(|l| l == "f 1 2 3"));
//!
//! let parsed = parse_obj(&text).unwrap();
//! assert_eq!(parsed, mesh);
//! ```

use std::fmt;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use mesh_types::{Face, IndexedMesh, Vertex};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{IoError, IoResult};

/// Display adapter that renders a mesh as OBJ text.
struct ObjText<'a>(&'a IndexedMesh);

impl fmt::Display for ObjText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mesh = self.0;
        writeln!(
            f,
            "# body scan mesh: {} vertices, {} faces",
            mesh.vertices.len(),
            mesh.faces.len()
        )?;

        for v in &mesh.vertices {
            writeln!(f, "v {} {} {}", v.position.x, v.position.y, v.position.z)?;
        }

        for &[a, b, c] in &mesh.faces {
            writeln!(
                f,
                "f {} {} {}",
                u64::from(a) + 1,
                u64::from(b) + 1,
                u64::from(c) + 1
            )?;
        }

        Ok(())
    }
}

/// Render a mesh as OBJ text.
///
/// Faces are emitted in stored order. No index validation is performed; the
/// capture pipeline guarantees valid indices before export.
#[must_use]
pub fn to_obj_string(mesh: &IndexedMesh) -> String {
    ObjText(mesh).to_string()
}

/// Stream a mesh as OBJ text into any writer.
///
/// # Errors
///
/// Returns an error if the writer fails.
pub fn write_obj<W: Write>(mesh: &IndexedMesh, mut writer: W) -> IoResult<()> {
    write!(writer, "{}", ObjText(mesh))?;
    writer.flush()?;
    Ok(())
}

/// Save a mesh to an OBJ file, all or nothing.
///
/// The text is written to a temporary file in the destination directory,
/// synced, then renamed over `path`. On failure the destination is left
/// untouched.
///
/// # Errors
///
/// Returns an error if the temporary file cannot be created or written, or
/// if the final rename fails.
///
/// # Example
///
/// ```no_run
/// use mesh_io::save_obj;
/// use mesh_types::IndexedMesh;
///
/// save_obj(&IndexedMesh::new(), "scan.obj").unwrap();
/// ```
pub fn save_obj<P: AsRef<Path>>(mesh: &IndexedMesh, path: P) -> IoResult<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let writer = BufWriter::new(tmp.as_file_mut());
        write_obj(mesh, writer)?;
    }
    tmp.as_file().sync_all()?;

    tmp.persist(path).map_err(|e| IoError::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;

    debug!(
        path = %path.display(),
        vertices = mesh.vertices.len(),
        faces = mesh.faces.len(),
        "Saved OBJ"
    );
    Ok(())
}

/// Load a mesh from an OBJ file.
///
/// # Errors
///
/// Returns [`IoError::FileNotFound`] if the file does not exist, or any
/// error from [`parse_obj`].
pub fn load_obj<P: AsRef<Path>>(path: P) -> IoResult<IndexedMesh> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IoError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IoError::Io(e)
        }
    })?;
    parse_obj(&text)
}

/// Parse OBJ text into a mesh.
///
/// Reads `v` and `f` records and ignores everything else (comments, normals,
/// texture coordinates, groups, materials). Face references may use the
/// `v`, `v/t`, `v//n` or `v/t/n` forms and negative (relative) indices.
/// Polygons with more than three corners are fan-triangulated.
///
/// # Errors
///
/// Returns [`IoError::InvalidContent`] for a vertex with fewer than three
/// coordinates, a face with fewer than three corners, an unparsable number,
/// index `0`, or an index that refers to a vertex not yet defined.
pub fn parse_obj(text: &str) -> IoResult<IndexedMesh> {
    let mut mesh = IndexedMesh::new();

    for (line_idx, raw) in text.lines().enumerate() {
        let line_no = line_idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("v") => {
                let coords = tokens
                    .take(3)
                    .map(|t| parse_coord(t, line_no))
                    .collect::<IoResult<Vec<f64>>>()?;
                if coords.len() < 3 {
                    return Err(IoError::invalid_content(
                        line_no,
                        "vertex needs three coordinates",
                    ));
                }
                mesh.vertices
                    .push(Vertex::from_coords(coords[0], coords[1], coords[2]));
            }
            Some("f") => {
                let vertex_count = mesh.vertices.len();
                let corners = tokens
                    .map(|t| resolve_index(t, vertex_count, line_no))
                    .collect::<IoResult<Vec<u32>>>()?;
                if corners.len() < 3 {
                    return Err(IoError::invalid_content(
                        line_no,
                        "face needs at least three vertices",
                    ));
                }
                mesh.faces.extend(fan(&corners));
            }
            _ => {}
        }
    }

    Ok(mesh)
}

fn parse_coord(token: &str, line: usize) -> IoResult<f64> {
    token
        .parse::<f64>()
        .map_err(|e| IoError::invalid_content(line, format!("bad coordinate {token:?}: {e}")))
}

/// Resolve a 1-based (or negative, relative) OBJ reference to a 0-based index.
fn resolve_index(token: &str, vertex_count: usize, line: usize) -> IoResult<u32> {
    let head = token.split('/').next().unwrap_or(token);
    let raw: i64 = head
        .parse()
        .map_err(|e| IoError::invalid_content(line, format!("bad index {token:?}: {e}")))?;

    let count = i64::try_from(vertex_count).unwrap_or(i64::MAX);
    let resolved = match raw {
        0 => return Err(IoError::invalid_content(line, "index 0 is not valid in OBJ")),
        r if r > 0 => r - 1,
        r => count + r,
    };

    if resolved < 0 || resolved >= count {
        return Err(IoError::invalid_content(
            line,
            format!("index {raw} out of range ({vertex_count} vertices defined)"),
        ));
    }

    u32::try_from(resolved)
        .map_err(|_| IoError::invalid_content(line, format!("index {raw} exceeds u32")))
}

fn fan(corners: &[u32]) -> impl Iterator<Item = Face> + '_ {
    (1..corners.len() - 1).map(move |i| [corners[0], corners[i], corners[i + 1]])
}
