//! Minimal glTF 2.0 (`.gltf` JSON) reader.
//!
//! Supports the node hierarchy with TRS or matrix transforms and triangle
//! primitives with `POSITION`, optional `TEXCOORD_0` and optional indices.
//! Buffers come from files next to the document or from base64 `data:` URIs.
//! Materials keep only `baseColorFactor`.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use base64::Engine as _;
use glam::{Mat4, Quat, Vec2, Vec3};
use serde::Deserialize;

use crate::scene::{Color, Geometry, Material, Node, Transform};

use super::AssetError;

const MODE_TRIANGLES: u32 = 4;

const COMPONENT_U8: u32 = 5121;
const COMPONENT_U16: u32 = 5123;
const COMPONENT_U32: u32 = 5125;
const COMPONENT_F32: u32 = 5126;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Document {
    #[serde(default)]
    scene: Option<usize>,
    #[serde(default)]
    scenes: Vec<SceneDef>,
    #[serde(default)]
    nodes: Vec<NodeDef>,
    #[serde(default)]
    meshes: Vec<MeshDef>,
    #[serde(default)]
    materials: Vec<MaterialDef>,
    #[serde(default)]
    accessors: Vec<AccessorDef>,
    #[serde(default)]
    buffer_views: Vec<BufferViewDef>,
    #[serde(default)]
    buffers: Vec<BufferDef>,
}

#[derive(Debug, Deserialize)]
struct SceneDef {
    #[serde(default)]
    nodes: Vec<usize>,
}

#[derive(Debug, Deserialize)]
struct NodeDef {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    children: Vec<usize>,
    #[serde(default)]
    mesh: Option<usize>,
    #[serde(default)]
    matrix: Option<[f32; 16]>,
    #[serde(default)]
    translation: Option<[f32; 3]>,
    /// Quaternion `[x, y, z, w]`.
    #[serde(default)]
    rotation: Option<[f32; 4]>,
    #[serde(default)]
    scale: Option<[f32; 3]>,
}

#[derive(Debug, Deserialize)]
struct MeshDef {
    #[serde(default)]
    name: Option<String>,
    primitives: Vec<PrimitiveDef>,
}

#[derive(Debug, Deserialize)]
struct PrimitiveDef {
    attributes: HashMap<String, usize>,
    #[serde(default)]
    indices: Option<usize>,
    #[serde(default)]
    material: Option<usize>,
    #[serde(default)]
    mode: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MaterialDef {
    #[serde(default)]
    pbr_metallic_roughness: Option<PbrDef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PbrDef {
    #[serde(default)]
    base_color_factor: Option<[f32; 4]>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccessorDef {
    #[serde(default)]
    buffer_view: Option<usize>,
    #[serde(default)]
    byte_offset: usize,
    component_type: u32,
    count: usize,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BufferViewDef {
    buffer: usize,
    #[serde(default)]
    byte_offset: usize,
    byte_length: usize,
    #[serde(default)]
    byte_stride: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BufferDef {
    #[serde(default)]
    uri: Option<String>,
    byte_length: usize,
}

/// Loads a `.gltf` file into a node tree rooted at a group named after the file.
pub fn load_gltf(path: &Path) -> Result<Node, AssetError> {
    let text = std::fs::read_to_string(path).map_err(|e| AssetError::io(path, e))?;
    let base = path.parent().unwrap_or(Path::new("."));
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_owned());
    parse(&text, base, name)
}

fn parse(text: &str, base: &Path, name: String) -> Result<Node, AssetError> {
    let doc: Document = serde_json::from_str(text)?;
    let buffers = doc
        .buffers
        .iter()
        .map(|b| load_buffer(b, base))
        .collect::<Result<Vec<_>, _>>()?;

    let reader = Reader { doc: &doc, buffers };

    let roots: Vec<usize> = match doc.scene.and_then(|i| doc.scenes.get(i)).or(doc.scenes.first()) {
        Some(scene) => scene.nodes.clone(),
        // No scenes: every node that is nobody's child is a root.
        None => {
            let children: Vec<usize> = doc.nodes.iter().flat_map(|n| n.children.iter().copied()).collect();
            (0..doc.nodes.len()).filter(|i| !children.contains(i)).collect()
        }
    };

    let mut root = Node::group(name);
    for index in roots {
        root.children.push(reader.node(index, 0)?);
    }
    log::debug!("glTF `{}`: {} mesh parts", root.name, root.mesh_count());
    Ok(root)
}

fn load_buffer(def: &BufferDef, base: &Path) -> Result<Vec<u8>, AssetError> {
    let Some(uri) = def.uri.as_deref() else {
        return Err(AssetError::Unsupported("buffer without uri (.glb)".into()));
    };

    let bytes = if let Some(rest) = uri.strip_prefix("data:") {
        let Some((_, payload)) = rest.split_once(";base64,") else {
            return Err(AssetError::Unsupported("non-base64 data uri".into()));
        };
        base64::engine::general_purpose::STANDARD.decode(payload)?
    } else {
        let path = base.join(uri);
        std::fs::read(&path).map_err(|e| AssetError::io(path, e))?
    };

    if bytes.len() < def.byte_length {
        return Err(AssetError::Unsupported(format!(
            "buffer holds {} bytes, declared {}",
            bytes.len(),
            def.byte_length
        )));
    }
    Ok(bytes)
}

struct Reader<'a> {
    doc: &'a Document,
    buffers: Vec<Vec<u8>>,
}

impl Reader<'_> {
    fn node(&self, index: usize, depth: usize) -> Result<Node, AssetError> {
        // Cycles are invalid glTF; bail out instead of recursing forever.
        if depth > 64 {
            return Err(AssetError::Unsupported("node hierarchy too deep".into()));
        }
        let def = self
            .doc
            .nodes
            .get(index)
            .ok_or_else(|| AssetError::Unsupported(format!("missing node {index}")))?;

        let mut node = Node::group(def.name.clone().unwrap_or_else(|| format!("node{index}")));
        node.transform = transform(def);

        if let Some(mesh_index) = def.mesh {
            let mesh = self
                .doc
                .meshes
                .get(mesh_index)
                .ok_or_else(|| AssetError::Unsupported(format!("missing mesh {mesh_index}")))?;
            let mesh_name = mesh.name.clone().unwrap_or_else(|| format!("mesh{mesh_index}"));

            for (i, primitive) in mesh.primitives.iter().enumerate() {
                if primitive.mode.unwrap_or(MODE_TRIANGLES) != MODE_TRIANGLES {
                    log::warn!("glTF mesh `{mesh_name}` primitive {i}: non-triangle mode skipped");
                    continue;
                }
                let geometry = self.geometry(primitive)?;
                let material = self.material(primitive.material);
                node.children
                    .push(Node::mesh(format!("{mesh_name}.{i}"), Arc::new(geometry), material));
            }
        }

        for &child in &def.children {
            node.children.push(self.node(child, depth + 1)?);
        }
        Ok(node)
    }

    fn geometry(&self, primitive: &PrimitiveDef) -> Result<Geometry, AssetError> {
        let position = *primitive
            .attributes
            .get("POSITION")
            .ok_or_else(|| AssetError::Unsupported("primitive without POSITION".into()))?;

        let positions: Vec<Vec3> = self
            .floats(position, "VEC3")?
            .chunks_exact(3)
            .map(|c| Vec3::new(c[0], c[1], c[2]))
            .collect();

        // glTF puts v = 0 at the top of the image; textures sample from the bottom.
        let uvs: Vec<Vec2> = match primitive.attributes.get("TEXCOORD_0") {
            Some(&accessor) => self
                .floats(accessor, "VEC2")?
                .chunks_exact(2)
                .map(|c| Vec2::new(c[0], 1.0 - c[1]))
                .collect(),
            None => Vec::new(),
        };

        let indices = match primitive.indices {
            Some(accessor) => self.indices(accessor)?,
            None => (0..positions.len() as u32).collect(),
        };
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= positions.len()) {
            return Err(AssetError::Unsupported(format!("index {bad} out of range")));
        }

        Ok(Geometry {
            positions,
            uvs,
            indices,
        })
    }

    fn material(&self, index: Option<usize>) -> Material {
        let factor = index
            .and_then(|i| self.doc.materials.get(i))
            .and_then(|m| m.pbr_metallic_roughness.as_ref())
            .and_then(|pbr| pbr.base_color_factor);
        match factor {
            Some(f) => {
                let c = f.map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8);
                Material::color(Color::from(c))
            }
            None => Material::default(),
        }
    }

    /// Element bytes of an accessor, one slice per element.
    fn elements(&self, index: usize, element_size: usize) -> Result<Vec<&[u8]>, AssetError> {
        let out_of_bounds = || AssetError::OutOfBounds { accessor: index };
        let accessor = self.doc.accessors.get(index).ok_or_else(out_of_bounds)?;
        let view_index = accessor
            .buffer_view
            .ok_or_else(|| AssetError::Unsupported("sparse or empty accessor".into()))?;
        let view = self
            .doc
            .buffer_views
            .get(view_index)
            .ok_or_else(out_of_bounds)?;
        let buffer = self.buffers.get(view.buffer).ok_or_else(out_of_bounds)?;

        let view_end = view
            .byte_offset
            .checked_add(view.byte_length)
            .ok_or_else(out_of_bounds)?;
        let view_bytes = buffer
            .get(view.byte_offset..view_end)
            .ok_or_else(out_of_bounds)?;

        let stride = view.byte_stride.unwrap_or(element_size);
        if stride < element_size {
            return Err(AssetError::Unsupported(format!(
                "accessor {index}: stride {stride} shorter than element size {element_size}"
            )));
        }

        // Sizes come from the document; the last element must end inside the view.
        if accessor.count > 0 {
            let last_end = (accessor.count - 1)
                .checked_mul(stride)
                .and_then(|span| span.checked_add(accessor.byte_offset))
                .and_then(|start| start.checked_add(element_size))
                .ok_or_else(out_of_bounds)?;
            if last_end > view_bytes.len() {
                return Err(out_of_bounds());
            }
        }

        (0..accessor.count)
            .map(|i| {
                let start = accessor.byte_offset + i * stride;
                view_bytes.get(start..start + element_size).ok_or_else(out_of_bounds)
            })
            .collect()
    }

    fn floats(&self, index: usize, kind: &str) -> Result<Vec<f32>, AssetError> {
        let accessor = self
            .doc
            .accessors
            .get(index)
            .ok_or(AssetError::OutOfBounds { accessor: index })?;
        let components = match kind {
            "VEC2" => 2,
            _ => 3,
        };
        if accessor.component_type != COMPONENT_F32 || accessor.kind != kind {
            return Err(AssetError::Unsupported(format!(
                "accessor {index}: expected float {kind}, got {} {}",
                accessor.component_type, accessor.kind
            )));
        }

        let elements = self.elements(index, components * 4)?;
        let mut out = Vec::with_capacity(elements.len() * components);
        for element in elements {
            out.extend(
                element
                    .chunks_exact(4)
                    .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]])),
            );
        }
        Ok(out)
    }

    fn indices(&self, index: usize) -> Result<Vec<u32>, AssetError> {
        let accessor = self
            .doc
            .accessors
            .get(index)
            .ok_or(AssetError::OutOfBounds { accessor: index })?;
        if accessor.kind != "SCALAR" {
            return Err(AssetError::Unsupported(format!("index accessor of type {}", accessor.kind)));
        }

        let (size, read): (usize, fn(&[u8]) -> u32) = match accessor.component_type {
            COMPONENT_U8 => (1, |b| b[0] as u32),
            COMPONENT_U16 => (2, |b| u16::from_le_bytes([b[0], b[1]]) as u32),
            COMPONENT_U32 => (4, |b| u32::from_le_bytes([b[0], b[1], b[2], b[3]])),
            other => {
                return Err(AssetError::Unsupported(format!("index component type {other}")));
            }
        };
        Ok(self.elements(index, size)?.into_iter().map(read).collect())
    }
}

fn transform(def: &NodeDef) -> Transform {
    if let Some(m) = def.matrix {
        let (scale, rotation, translation) = Mat4::from_cols_array(&m).to_scale_rotation_translation();
        return Transform::from_trs(translation, rotation, scale);
    }
    Transform::from_trs(
        def.translation.map(Vec3::from).unwrap_or(Vec3::ZERO),
        def.rotation.map(Quat::from_array).unwrap_or(Quat::IDENTITY),
        def.scale.map(Vec3::from).unwrap_or(Vec3::ONE),
    )
}
