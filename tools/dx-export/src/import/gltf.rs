//! glTF 2.0 importer (glTF/GLB -> scene snapshot)
//!
//! - every node with a mesh becomes a selected mesh object (primitives merged)
//! - every skin becomes a selected armature whose bones are the skin's joints
//! - every animation that moves a skin's joints becomes an action of that armature
//!
//! glTF is Y-up while scene snapshots are Z-up, so all geometry and matrices are
//! converted on the way in. Skinned meshes are assumed to sit at the origin of
//! their armature, which is how common exporters write them.

use anyhow::{bail, Context, Result};
use glam::{Mat4, Quat, Vec3, Vec4};
use gltf::animation::util::ReadOutputs;
use gltf::animation::{Interpolation, Property};
use hashbrown::HashMap;
use std::path::Path;

use dxport_shared::{
    Action, Armature, Bone, Channel, Face, GroupMember, Material, Mesh, ObjectData, Scene,
    SceneObject, Vertex, VertexGroup,
};

/// Default sample rate for animations (frames per second)
pub const DEFAULT_FRAME_RATE: f32 = 30.0;

/// glTF (Y-up) to scene (Z-up) basis: (x, y, z) -> (x, -z, y)
const Y_UP_TO_Z_UP: Mat4 = Mat4::from_cols(Vec4::X, Vec4::Z, Vec4::NEG_Y, Vec4::W);

fn basis_point(v: Vec3) -> Vec3 {
    Y_UP_TO_Z_UP.transform_vector3(v)
}

fn basis_matrix(m: Mat4) -> Mat4 {
    Y_UP_TO_Z_UP * m * Y_UP_TO_Z_UP.transpose()
}

/// Load a glTF/GLB file as a scene snapshot.
///
/// Keyframe times are converted to integer frames at `frame_rate`.
/// Images are not decoded; materials only keep their texture file name.
pub fn import_scene(input: &Path, frame_rate: f32) -> Result<Scene> {
    if !(frame_rate.is_finite() && frame_rate > 0.0) {
        bail!("Frame rate must be positive, got {}", frame_rate);
    }

    let gltf::Gltf { document, blob } =
        gltf::Gltf::open(input).with_context(|| format!("Failed to load glTF: {:?}", input))?;
    let buffers = gltf::import_buffers(&document, input.parent(), blob)
        .with_context(|| format!("Failed to load glTF buffers: {:?}", input))?;

    let graph = NodeGraph::new(&document)?;
    let rest_worlds = graph.worlds(&graph.rest_locals());
    let nodes: Vec<gltf::Node> = document.nodes().collect();

    let skins = document
        .skins()
        .map(|skin| ImportedSkin::new(&skin, &buffers, &graph, &rest_worlds))
        .collect::<Result<Vec<_>>>()?;

    let mut objects = Vec::new();
    for &index in &graph.order {
        let node = &nodes[index];
        let Some(mesh) = node.mesh() else {
            continue;
        };
        let name = node
            .name()
            .or_else(|| mesh.name())
            .map(str::to_owned)
            .unwrap_or_else(|| format!("Mesh_{}", index));
        let bones = node.skin().map(|skin| skins[skin.index()].names.as_slice());

        let data = import_mesh(&mesh, &buffers, rest_worlds[index], bones)
            .with_context(|| format!("Failed to import mesh '{}'", name))?;
        tracing::info!(
            "Imported mesh '{}': {} vertices, {} faces",
            name,
            data.vertices.len(),
            data.faces.len()
        );
        objects.push(SceneObject {
            name,
            selected: true,
            data: ObjectData::Mesh(data),
        });
    }

    for skin in skins {
        let mut armature = skin.armature;
        for animation in document.animations() {
            let action = import_action(
                &animation,
                &buffers,
                &graph,
                &skin.joints,
                &skin.names,
                frame_rate,
            )?;
            armature.actions.extend(action);
        }
        tracing::info!(
            "Imported armature '{}': {} bones, {} actions",
            skin.name,
            armature.bones.len(),
            armature.actions.len()
        );
        objects.push(SceneObject {
            name: skin.name,
            selected: true,
            data: ObjectData::Armature(armature),
        });
    }

    Ok(Scene { objects })
}

// ============================================================================
// Node hierarchy
// ============================================================================

/// Parent links and rest transforms of every node.
struct NodeGraph {
    parents: Vec<Option<usize>>,
    rest: Vec<(Vec3, Quat, Vec3)>,
    /// Nodes of the active scene, parents before children
    order: Vec<usize>,
}

impl NodeGraph {
    fn new(document: &gltf::Document) -> Result<Self> {
        let count = document.nodes().len();
        let mut parents = vec![None; count];
        let mut rest = Vec::with_capacity(count);
        for node in document.nodes() {
            for child in node.children() {
                parents[child.index()] = Some(node.index());
            }
            let (t, r, s) = node.transform().decomposed();
            rest.push((Vec3::from(t), Quat::from_array(r), Vec3::from(s)));
        }

        let scene = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .context("glTF file has no scene")?;

        let mut order = Vec::with_capacity(count);
        let mut visited = vec![false; count];
        let mut stack: Vec<gltf::Node> = scene.nodes().collect();
        stack.reverse();
        while let Some(node) = stack.pop() {
            if std::mem::replace(&mut visited[node.index()], true) {
                continue;
            }
            order.push(node.index());
            let mut children: Vec<_> = node.children().collect();
            children.reverse();
            stack.extend(children);
        }

        Ok(Self {
            parents,
            rest,
            order,
        })
    }

    fn rest_locals(&self) -> Vec<Mat4> {
        self.rest
            .iter()
            .map(|&(t, r, s)| Mat4::from_scale_rotation_translation(s, r, t))
            .collect()
    }

    /// World matrices (glTF basis) of the scene's nodes for the given locals.
    fn worlds(&self, locals: &[Mat4]) -> Vec<Mat4> {
        let mut worlds = vec![Mat4::IDENTITY; locals.len()];
        for &index in &self.order {
            let parent = self.parents[index].map_or(Mat4::IDENTITY, |p| worlds[p]);
            worlds[index] = parent * locals[index];
        }
        worlds
    }
}

// ============================================================================
// Meshes
// ============================================================================

fn import_mesh(
    mesh: &gltf::Mesh,
    buffers: &[gltf::buffer::Data],
    world: Mat4,
    bones: Option<&[String]>,
) -> Result<Mesh> {
    let mut out = Mesh {
        world: basis_matrix(world),
        ..Default::default()
    };
    let mut slots: HashMap<Option<usize>, usize> = HashMap::new();
    let mut groups: Vec<Vec<GroupMember>> = vec![Vec::new(); bones.map_or(0, <[_]>::len)];

    for primitive in mesh.primitives() {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            tracing::warn!(
                "Skipping primitive {} ({:?}), only triangles are supported",
                primitive.index(),
                primitive.mode()
            );
            continue;
        }

        let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

        // Positions (required)
        let positions: Vec<[f32; 3]> = reader
            .read_positions()
            .context("No positions in primitive")?
            .collect();
        let normals: Option<Vec<[f32; 3]>> = reader.read_normals().map(|iter| iter.collect());
        let uvs: Option<Vec<[f32; 2]>> = reader
            .read_tex_coords(0)
            .map(|iter| iter.into_f32().collect());
        let colors: Option<Vec<[u8; 4]>> = reader
            .read_colors(0)
            .map(|iter| iter.into_rgba_u8().collect());
        let indices: Vec<u32> = match reader.read_indices() {
            Some(iter) => iter.into_u32().collect(),
            None => (0..positions.len() as u32).collect(),
        };

        if let Some(&index) = indices.iter().find(|&&i| i as usize >= positions.len()) {
            bail!(
                "Index {} out of range in primitive {} ({} vertices)",
                index,
                primitive.index(),
                positions.len()
            );
        }

        let base = out.vertices.len() as u32;
        for (i, &position) in positions.iter().enumerate() {
            let normal = normals
                .as_ref()
                .and_then(|n| n.get(i))
                .map_or(Vec3::ZERO, |&n| Vec3::from(n));
            out.vertices.push(Vertex {
                index: base + i as u32,
                position: basis_point(Vec3::from(position)),
                normal: basis_point(normal),
            });
        }

        let material = primitive.material();
        let slot = *slots.entry(material.index()).or_insert_with(|| {
            out.materials.push(import_material(&material));
            out.materials.len() - 1
        });
        let image = base_color_image(&material);

        for tri in indices.chunks_exact(3) {
            out.faces.push(Face {
                vertices: tri.iter().map(|&i| base + i).collect(),
                material: Some(slot),
                colors: colors.as_ref().map(|c| {
                    tri.iter()
                        .map(|&i| c.get(i as usize).copied().unwrap_or([255; 4]))
                        .collect()
                }),
                uvs: uvs.as_ref().map(|u| {
                    tri.iter()
                        .map(|&i| u.get(i as usize).copied().unwrap_or([0.0, 0.0]))
                        .collect()
                }),
                image: image.clone(),
            });
        }

        // Skinning data (optional) - JOINTS_0 and WEIGHTS_0
        if bones.is_some() {
            if let (Some(joints), Some(weights)) = (reader.read_joints(0), reader.read_weights(0)) {
                for (i, (joint_set, weight_set)) in
                    joints.into_u16().zip(weights.into_f32()).enumerate()
                {
                    let vertex = base + i as u32;
                    for (&joint, &weight) in joint_set.iter().zip(&weight_set) {
                        if weight <= 0.0 {
                            continue;
                        }
                        let Some(group) = groups.get_mut(joint as usize) else {
                            bail!("Joint index {} at vertex {} is not in the skin", joint, i);
                        };
                        match group.last_mut() {
                            Some(last) if last.vertex == vertex => last.weight += weight,
                            _ => group.push(GroupMember { vertex, weight }),
                        }
                    }
                }
            }
        }
    }

    if let Some(bones) = bones {
        out.groups = bones
            .iter()
            .zip(groups)
            .filter(|(_, members)| !members.is_empty())
            .map(|(name, members)| VertexGroup {
                name: name.clone(),
                members,
            })
            .collect();
    }

    Ok(out)
}

/// glTF's metallic-roughness model has no Phong equivalent; specular stays black.
fn import_material(material: &gltf::Material) -> Material {
    let name = match (material.name(), material.index()) {
        (Some(name), _) => name.to_string(),
        (None, Some(index)) => format!("Material_{}", index),
        (None, None) => "Default".to_string(),
    };
    Material {
        diffuse: material.pbr_metallic_roughness().base_color_factor(),
        ..Material::new(name)
    }
}

fn base_color_image(material: &gltf::Material) -> Option<String> {
    let image = material
        .pbr_metallic_roughness()
        .base_color_texture()?
        .texture()
        .source();
    match image.source() {
        gltf::image::Source::Uri { uri, .. } => Some(uri.to_string()),
        gltf::image::Source::View { .. } => image.name().map(str::to_owned),
    }
}

// ============================================================================
// Skins
// ============================================================================

struct ImportedSkin {
    name: String,
    /// Node index per joint
    joints: Vec<usize>,
    /// Bone name per joint
    names: Vec<String>,
    armature: Armature,
}

impl ImportedSkin {
    fn new(
        skin: &gltf::Skin,
        buffers: &[gltf::buffer::Data],
        graph: &NodeGraph,
        rest_worlds: &[Mat4],
    ) -> Result<Self> {
        let name = skin
            .name()
            .map(str::to_owned)
            .unwrap_or_else(|| format!("Armature_{}", skin.index()));
        let joints: Vec<usize> = skin.joints().map(|j| j.index()).collect();
        let names: Vec<String> = skin
            .joints()
            .map(|j| {
                j.name()
                    .map(str::to_owned)
                    .unwrap_or_else(|| format!("Joint_{}", j.index()))
            })
            .collect();
        if joints.is_empty() {
            bail!("Skin '{}' has no joints", name);
        }

        let joint_of: HashMap<usize, usize> =
            joints.iter().enumerate().map(|(i, &node)| (node, i)).collect();

        // Bind pose: inverse of the inverse bind matrices, or the rest pose without them
        let reader = skin.reader(|buffer| Some(&buffers[buffer.index()]));
        let binds: Vec<Mat4> = match reader.read_inverse_bind_matrices() {
            Some(iter) => iter
                .map(|m| Mat4::from_cols_array_2d(&m).inverse())
                .collect(),
            None => joints.iter().map(|&node| rest_worlds[node]).collect(),
        };
        if binds.len() < joints.len() {
            bail!(
                "Skin '{}' has {} inverse bind matrices for {} joints",
                name,
                binds.len(),
                joints.len()
            );
        }

        let bones = joints
            .iter()
            .zip(&names)
            .zip(&binds)
            .map(|((&node, bone_name), &bind)| {
                // Nearest ancestor that is a joint of this skin
                let mut parent = graph.parents[node];
                while let Some(p) = parent {
                    if joint_of.contains_key(&p) {
                        break;
                    }
                    parent = graph.parents[p];
                }
                Bone {
                    name: bone_name.clone(),
                    parent: parent.map(|p| names[joint_of[&p]].clone()),
                    matrix: basis_matrix(bind),
                }
            })
            .collect();

        Ok(Self {
            name,
            joints,
            names,
            armature: Armature {
                bones,
                actions: Vec::new(),
            },
        })
    }
}

// ============================================================================
// Animations
// ============================================================================

/// Keyframes of one animated node property.
struct Track {
    node: usize,
    property: Property,
    interpolation: Interpolation,
    times: Vec<f32>,
    /// Translation/scale as xyz, rotation as quaternion xyzw
    values: Vec<Vec4>,
}

impl Track {
    /// Value at time `t`, holding the first/last key outside the keyed range.
    fn sample(&self, t: f32) -> Vec4 {
        let next = self.times.partition_point(|&k| k <= t);
        if next == 0 {
            return self.values[0];
        }
        if next >= self.times.len() {
            return self.values[self.times.len() - 1];
        }

        let i = next - 1;
        if matches!(self.interpolation, Interpolation::Step) {
            return self.values[i];
        }

        let (t0, t1) = (self.times[i], self.times[i + 1]);
        let factor = if t1 > t0 { (t - t0) / (t1 - t0) } else { 0.0 };
        let factor = factor.clamp(0.0, 1.0);

        match self.property {
            Property::Rotation => {
                let q0 = Quat::from_vec4(self.values[i]).normalize();
                let q1 = Quat::from_vec4(self.values[i + 1]).normalize();
                Vec4::from(q0.slerp(q1, factor))
            }
            _ => self.values[i].lerp(self.values[i + 1], factor),
        }
    }
}

fn read_tracks(
    animation: &gltf::Animation,
    buffers: &[gltf::buffer::Data],
    joints: &[usize],
) -> Result<Vec<Track>> {
    let mut tracks = Vec::new();
    for channel in animation.channels() {
        let node = channel.target().node().index();
        if !joints.contains(&node) {
            continue;
        }

        let reader = channel.reader(|buffer| Some(&buffers[buffer.index()]));
        let times: Vec<f32> = reader
            .read_inputs()
            .context("Animation channel has no keyframe times")?
            .collect();
        let values: Vec<Vec4> = match reader
            .read_outputs()
            .context("Animation channel has no keyframe values")?
        {
            ReadOutputs::Translations(iter) | ReadOutputs::Scales(iter) => {
                iter.map(|v| Vec3::from(v).extend(0.0)).collect()
            }
            ReadOutputs::Rotations(iter) => iter.into_f32().map(Vec4::from).collect(),
            ReadOutputs::MorphTargetWeights(_) => continue,
        };

        let interpolation = channel.sampler().interpolation();
        // Cubic splines store in-tangent, value, out-tangent per key; keep the values
        let values: Vec<Vec4> = match interpolation {
            Interpolation::CubicSpline => values.chunks_exact(3).map(|c| c[1]).collect(),
            _ => values,
        };

        if times.is_empty() || values.len() < times.len() {
            tracing::warn!(
                "Skipping animation channel on node {}: {} keys, {} values",
                node,
                times.len(),
                values.len()
            );
            continue;
        }

        tracks.push(Track {
            node,
            property: channel.target().property(),
            interpolation,
            times,
            values,
        });
    }
    Ok(tracks)
}

/// Sample `animation` into an action posing every joint of the skin.
///
/// Returns `None` when the animation moves none of the skin's joints.
fn import_action(
    animation: &gltf::Animation,
    buffers: &[gltf::buffer::Data],
    graph: &NodeGraph,
    joints: &[usize],
    names: &[String],
    frame_rate: f32,
) -> Result<Option<Action>> {
    let tracks = read_tracks(animation, buffers, joints)?;
    if tracks.is_empty() {
        return Ok(None);
    }

    let mut frames: Vec<i32> = tracks
        .iter()
        .flat_map(|track| &track.times)
        .map(|&t| (t * frame_rate).round() as i32)
        .collect();
    frames.sort_unstable();
    frames.dedup();

    let mut channels: Vec<Channel> = names
        .iter()
        .map(|name| Channel {
            bone: name.clone(),
            poses: Vec::with_capacity(frames.len()),
        })
        .collect();

    for &frame in &frames {
        let t = frame as f32 / frame_rate;
        let mut trs = graph.rest.clone();
        for track in &tracks {
            let value = track.sample(t);
            let (translation, rotation, scale) = &mut trs[track.node];
            match track.property {
                Property::Translation => *translation = value.truncate(),
                Property::Rotation => *rotation = Quat::from_vec4(value).normalize(),
                Property::Scale => *scale = value.truncate(),
                Property::MorphTargetWeights => {}
            }
        }

        let locals: Vec<Mat4> = trs
            .iter()
            .map(|&(t, r, s)| Mat4::from_scale_rotation_translation(s, r, t))
            .collect();
        let worlds = graph.worlds(&locals);
        for (channel, &node) in channels.iter_mut().zip(joints) {
            channel.poses.push(basis_matrix(worlds[node]));
        }
    }

    let name = animation
        .name()
        .map(str::to_owned)
        .unwrap_or_else(|| format!("Action_{}", animation.index()));
    tracing::info!(
        "Imported animation '{}': {} frames at {} fps",
        name,
        frames.len(),
        frame_rate
    );

    Ok(Some(Action {
        name,
        frames,
        channels,
    }))
}
