//! Wavefront OBJ parsing.
//!
//! [`ObjModel`] is a plain parse of the text format: attribute arrays plus faces that
//! reference them. [`MeshData::from_obj`] turns that into the renderer's [`Vertex`]
//! layout, one fresh vertex per face corner.
//!
//! Only geometry statements are read. `o`, `g`, `s`, `usemtl`, `mtllib` and comments are
//! skipped, and every face in the file ends up in the same mesh.

use glam::{Vec2, Vec3, Vec4};

use crate::{abs::Vertex, error::ResourceError};

/// One corner of a face: zero-based indices into the model's attribute arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceVertex {
    pub position: usize,
    pub texcoord: Option<usize>,
    pub normal: Option<usize>,
}

/// The attribute arrays and faces of an OBJ file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjModel {
    pub positions: Vec<Vec4>,
    pub texcoords: Vec<Vec2>,
    pub normals: Vec<Vec3>,
    pub faces: Vec<Vec<FaceVertex>>,
}

impl std::str::FromStr for ObjModel {
    type Err = ResourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut model = ObjModel::default();

        for (number, line) in s.lines().enumerate() {
            let context = || format!("line {}", number + 1);
            let line = match line.find('#') {
                Some(comment) => &line[..comment],
                None => line,
            };
            let mut tokens = line.split_whitespace();
            let Some(keyword) = tokens.next() else {
                continue;
            };
            let args: Vec<&str> = tokens.collect();

            match keyword {
                "v" => {
                    let values =
                        floats(&args, 3, 4).map_err(|m| ResourceError::parse(context(), m))?;
                    let w = values.get(3).copied().unwrap_or(1.0);
                    model
                        .positions
                        .push(Vec4::new(values[0], values[1], values[2], w));
                }
                "vt" => {
                    let values =
                        floats(&args, 1, 3).map_err(|m| ResourceError::parse(context(), m))?;
                    let v = values.get(1).copied().unwrap_or(0.0);
                    model.texcoords.push(Vec2::new(values[0], v));
                }
                "vn" => {
                    let values =
                        floats(&args, 3, 3).map_err(|m| ResourceError::parse(context(), m))?;
                    model.normals.push(Vec3::new(values[0], values[1], values[2]));
                }
                "f" => {
                    if args.len() < 3 {
                        return Err(ResourceError::parse(
                            context(),
                            format!("face needs at least 3 vertices, found {}", args.len()),
                        ));
                    }
                    let face = args
                        .iter()
                        .map(|arg| model.face_vertex(arg))
                        .collect::<Result<Vec<_>, String>>()
                        .map_err(|m| ResourceError::parse(context(), m))?;
                    model.faces.push(face);
                }
                "o" | "g" | "s" | "usemtl" | "mtllib" | "l" | "p" => {}
                other => log::debug!("{}: ignoring OBJ statement `{}`", context(), other),
            }
        }

        Ok(model)
    }
}

impl ObjModel {
    /// Parses a `v`, `v/vt`, `v//vn` or `v/vt/vn` reference.
    fn face_vertex(&self, token: &str) -> Result<FaceVertex, String> {
        let mut parts = token.split('/');
        let position = match parts.next() {
            Some(p) if !p.is_empty() => resolve_index(p, self.positions.len(), "position")?,
            _ => return Err(format!("face vertex `{}` has no position", token)),
        };
        let texcoord = match parts.next() {
            Some(t) if !t.is_empty() => Some(resolve_index(t, self.texcoords.len(), "texcoord")?),
            _ => None,
        };
        let normal = match parts.next() {
            Some(n) if !n.is_empty() => Some(resolve_index(n, self.normals.len(), "normal")?),
            _ => None,
        };
        if parts.next().is_some() {
            return Err(format!("face vertex `{}` has too many components", token));
        }

        Ok(FaceVertex {
            position,
            texcoord,
            normal,
        })
    }
}

/// Converts a one-based (or negative, relative) OBJ index into a zero-based one.
fn resolve_index(token: &str, count: usize, what: &str) -> Result<usize, String> {
    let index: i64 = token
        .parse()
        .map_err(|_| format!("invalid {} index `{}`", what, token))?;
    let resolved = match index {
        0 => None,
        i if i > 0 => Some(i - 1),
        i => (count as i64).checked_add(i),
    };
    match resolved {
        Some(i) if i >= 0 && (i as usize) < count => Ok(i as usize),
        _ => Err(format!(
            "{} index {} out of range ({} defined)",
            what, index, count
        )),
    }
}

fn floats(args: &[&str], min: usize, max: usize) -> Result<Vec<f32>, String> {
    if args.len() < min || args.len() > max {
        return Err(format!(
            "expected {}..={} numbers, found {}",
            min,
            max,
            args.len()
        ));
    }
    args.iter()
        .map(|a| a.parse::<f32>().map_err(|_| format!("invalid number `{}`", a)))
        .collect()
}

/// CPU-side mesh data in the renderer's vertex layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Expands every triangle of `model` into three new vertices.
    ///
    /// Vertices are not shared between faces, so the indices are simply `0..3 * faces`.
    /// Colors are white. Missing texcoords and normals become zero. Any face that is not a
    /// triangle is rejected rather than triangulated.
    pub fn from_obj(model: &ObjModel) -> Result<Self, ResourceError> {
        let mut vertices = Vec::with_capacity(model.faces.len() * 3);
        let mut indices = Vec::with_capacity(model.faces.len() * 3);

        for (i, face) in model.faces.iter().enumerate() {
            if face.len() != 3 {
                return Err(ResourceError::UnsupportedFormat(format!(
                    "face {} has {} vertices; only triangles are supported",
                    i,
                    face.len()
                )));
            }

            for corner in face {
                let dangling = || ResourceError::parse(format!("face {}", i), "dangling reference");
                let position = *model.positions.get(corner.position).ok_or_else(dangling)?;
                let uv = match corner.texcoord {
                    Some(t) => *model.texcoords.get(t).ok_or_else(dangling)?,
                    None => Vec2::ZERO,
                };
                let normal = match corner.normal {
                    Some(n) => *model.normals.get(n).ok_or_else(dangling)?,
                    None => Vec3::ZERO,
                };

                indices.push(vertices.len() as u32);
                vertices.push(Vertex {
                    position: position.to_array(),
                    color: [1.0; 4],
                    uv: uv.to_array(),
                    normal: normal.extend(0.0).to_array(),
                });
            }
        }

        Ok(Self { vertices, indices })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUBE_FACE: &str = "\
# two triangles of a quad
mtllib quad.mtl
o Quad
v -1.0 -1.0 0.0
v  1.0 -1.0 0.0
v  1.0  1.0 0.0
v -1.0  1.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 1.0 1.0
vt 0.0 1.0
vn 0.0 0.0 1.0
usemtl Material
s off
f 1/1/1 2/2/1 3/3/1
f 1/1/1 3/3/1 4/4/1
";

    #[test]
    fn parses_attributes_and_faces() {
        let model: ObjModel = CUBE_FACE.parse().unwrap();
        assert_eq!(model.positions.len(), 4);
        assert_eq!(model.texcoords.len(), 4);
        assert_eq!(model.normals.len(), 1);
        assert_eq!(model.faces.len(), 2);
        assert_eq!(
            model.faces[1][2],
            FaceVertex {
                position: 3,
                texcoord: Some(3),
                normal: Some(0),
            }
        );
        assert_eq!(model.positions[2], Vec4::new(1.0, 1.0, 0.0, 1.0));
    }

    #[test]
    fn triangles_expand_without_sharing() {
        let model: ObjModel = CUBE_FACE.parse().unwrap();
        let mesh = MeshData::from_obj(&model).unwrap();

        assert_eq!(mesh.vertices.len(), 6);
        assert_eq!(mesh.indices, (0..6).collect::<Vec<u32>>());
        // corner 1 appears in both faces and is duplicated
        assert_eq!(mesh.vertices[0], mesh.vertices[3]);
        for vertex in &mesh.vertices {
            assert_eq!(vertex.color, [1.0; 4]);
            assert_eq!(vertex.normal, [0.0, 0.0, 1.0, 0.0]);
            assert_eq!(vertex.position[3], 1.0);
        }
        assert_eq!(mesh.vertices[4].uv, [1.0, 1.0]);
    }

    #[test]
    fn rejects_quads() {
        let src = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3\nf 1 2 3 4\n";
        let model: ObjModel = src.parse().unwrap();
        let err = MeshData::from_obj(&model).unwrap_err();
        assert!(matches!(err, ResourceError::UnsupportedFormat(_)));
    }

    #[test]
    fn missing_attributes_default_to_zero() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2//1 3//1\nf 1 2 3\n";
        let model: ObjModel = src.parse().unwrap();
        let mesh = MeshData::from_obj(&model).unwrap();
        assert_eq!(mesh.vertices.len(), 6);
        assert_eq!(mesh.vertices[0].uv, [0.0; 2]);
        assert_eq!(mesh.vertices[0].normal, [0.0, 0.0, 1.0, 0.0]);
        assert_eq!(mesh.vertices[5].normal, [0.0; 4]);
    }

    #[test]
    fn hand_built_dangling_reference_fails() {
        let model = ObjModel {
            positions: vec![Vec4::W; 2],
            faces: vec![vec![
                FaceVertex {
                    position: 0,
                    texcoord: None,
                    normal: None,
                },
                FaceVertex {
                    position: 1,
                    texcoord: None,
                    normal: None,
                },
                FaceVertex {
                    position: 2,
                    texcoord: None,
                    normal: None,
                },
            ]],
            ..Default::default()
        };
        assert!(matches!(
            MeshData::from_obj(&model),
            Err(ResourceError::ParseFailure { .. })
        ));
    }

    #[test]
    fn negative_indices_are_relative() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n";
        let model: ObjModel = src.parse().unwrap();
        assert_eq!(model.faces[0][0].position, 0);
        assert_eq!(model.faces[0][2].position, 2);
    }

    #[test]
    fn out_of_range_reference_fails() {
        let err = "v 0 0 0\nv 1 0 0\nf 1 2 3\n"
            .parse::<ObjModel>()
            .unwrap_err();
        match err {
            ResourceError::ParseFailure { context, .. } => assert_eq!(context, "line 3"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!("v 0 0 0\nf 0 1 1\n".parse::<ObjModel>().is_err());
    }

    #[test]
    fn malformed_numbers_fail() {
        assert!("v 0 zero 0\n".parse::<ObjModel>().is_err());
        assert!("v 0 0\n".parse::<ObjModel>().is_err());
        assert!("vn 0 0 1 1\n".parse::<ObjModel>().is_err());
    }

    #[test]
    fn demo_cube() {
        let model: ObjModel = include_str!("../res/cube.obj").parse().unwrap();
        assert_eq!(model.faces.len(), 12);
        let mesh = MeshData::from_obj(&model).unwrap();
        assert_eq!(mesh.vertices.len(), 36);
        assert_eq!(mesh.indices, (0..36).collect::<Vec<u32>>());
    }

    #[test]
    fn empty_input_is_empty_mesh() {
        let model: ObjModel = "# nothing here\n\n".parse().unwrap();
        let mesh = MeshData::from_obj(&model).unwrap();
        assert!(mesh.vertices.is_empty());
        assert!(mesh.indices.is_empty());
    }
}
