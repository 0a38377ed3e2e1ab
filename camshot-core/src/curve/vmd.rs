//! Vocaloid Motion Data (`.vmd`) reader.
//!
//! Decodes what the pipeline consumes: bone keyframes (the character anchor is
//! derived from them) and camera keyframes. Morph records are skipped and the
//! light/shadow sections after the camera block are ignored. Camera-only files
//! frequently stop early; a section missing at end of file reads as empty.
//!
//! Layout (little endian):
//! - header[30], model name[20] (`...0002`) or [10] (`...file`)
//! - u32 bone count, 111-byte records
//! - u32 morph count, 23-byte records
//! - u32 camera count, 61-byte records

use bytes::{Buf, BufMut};
use glam::{Quat, Vec3};

use super::{BezierCurve, CameraCurve, CameraInterpolation, CameraKeyframe, Channel};
use crate::error::CurveError;

pub const MAGIC_V2: &[u8] = b"Vocaloid Motion Data 0002";
pub const MAGIC_V1: &[u8] = b"Vocaloid Motion Data file";

const HEADER_LEN: usize = 30;
const MODEL_NAME_V2: usize = 20;
const MODEL_NAME_V1: usize = 10;
const BONE_NAME_LEN: usize = 15;
const BONE_RECORD_LEN: usize = 111;
const MORPH_RECORD_LEN: usize = 23;
const CAMERA_RECORD_LEN: usize = 61;

/// Root bone ("センター") in Shift-JIS.
pub const CENTER_BONE: &[u8] = &[0x83, 0x5A, 0x83, 0x93, 0x83, 0x5E, 0x81, 0x5B];

/// Position and rotation easing of a bone keyframe.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoneInterpolation {
    pub x: BezierCurve,
    pub y: BezierCurve,
    pub z: BezierCurve,
    pub rotation: BezierCurve,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoneKeyframe {
    /// Shift-JIS name with the NUL padding stripped.
    pub name: Vec<u8>,
    pub frame: u32,
    pub position: Vec3,
    pub rotation: Quat,
    pub interpolation: BoneInterpolation,
}

#[derive(Debug, Clone, Default)]
pub struct VmdMotion {
    pub model_name: Vec<u8>,
    pub bones: Vec<BoneKeyframe>,
    pub camera: CameraCurve,
}

impl VmdMotion {
    /// Keyframes of the bone called `name`, ascending by frame.
    pub fn bone_track(&self, name: &[u8]) -> Vec<BoneKeyframe> {
        let mut track: Vec<BoneKeyframe> = self.bones.iter().filter(|b| b.name == name).cloned().collect();
        track.sort_by_key(|b| b.frame);
        track
    }
}

pub fn parse(data: &[u8]) -> Result<VmdMotion, CurveError> {
    let mut buf = data;
    ensure(buf, HEADER_LEN, "header")?;
    let header = &buf[..HEADER_LEN];
    let name_len = if header.starts_with(MAGIC_V2) {
        MODEL_NAME_V2
    } else if header.starts_with(MAGIC_V1) {
        MODEL_NAME_V1
    } else {
        return Err(CurveError::BadHeader(String::from_utf8_lossy(trim_nul(header)).into_owned()));
    };
    buf.advance(HEADER_LEN);
    ensure(buf, name_len, "model name")?;
    let model_name = trim_nul(&buf[..name_len]).to_vec();
    buf.advance(name_len);

    let mut bones = Vec::new();
    if let Some(count) = section(&mut buf, BONE_RECORD_LEN, "bone keyframes")? {
        bones.reserve(count);
        for _ in 0..count { bones.push(read_bone(&mut buf)); }
    }
    if let Some(count) = section(&mut buf, MORPH_RECORD_LEN, "morph keyframes")? {
        buf.advance(count * MORPH_RECORD_LEN);
    }
    let mut cameras = Vec::new();
    if let Some(count) = section(&mut buf, CAMERA_RECORD_LEN, "camera keyframes")? {
        cameras.reserve(count);
        for _ in 0..count { cameras.push(read_camera(&mut buf)); }
    }

    Ok(VmdMotion { model_name, bones, camera: CameraCurve::from_unsorted(cameras) })
}

/// Encode as a `...0002` file (bones, no morphs, camera). Used to write fixtures.
pub fn encode(motion: &VmdMotion) -> Vec<u8> {
    let cameras = motion.camera.keyframes();
    let mut out = Vec::with_capacity(
        HEADER_LEN + MODEL_NAME_V2 + 12 + motion.bones.len() * BONE_RECORD_LEN + cameras.len() * CAMERA_RECORD_LEN,
    );
    put_padded(&mut out, MAGIC_V2, HEADER_LEN);
    put_padded(&mut out, &motion.model_name, MODEL_NAME_V2);

    out.put_u32_le(motion.bones.len() as u32);
    for b in &motion.bones {
        put_padded(&mut out, &b.name, BONE_NAME_LEN);
        out.put_u32_le(b.frame);
        put_vec3(&mut out, b.position);
        for v in b.rotation.to_array() { out.put_f32_le(v); }
        let mut interp = [0u8; 64];
        let curves = [b.interpolation.x, b.interpolation.y, b.interpolation.z, b.interpolation.rotation];
        for (i, c) in curves.iter().enumerate() {
            let [x1, y1, x2, y2] = c.to_bytes();
            interp[i] = x1;
            interp[i + 4] = y1;
            interp[i + 8] = x2;
            interp[i + 12] = y2;
        }
        out.put_slice(&interp);
    }

    out.put_u32_le(0);

    out.put_u32_le(cameras.len() as u32);
    for k in cameras {
        out.put_u32_le(k.frame);
        out.put_f32_le(k.distance);
        put_vec3(&mut out, k.position);
        put_vec3(&mut out, Vec3::new(k.rotation.x.to_radians(), k.rotation.y.to_radians(), k.rotation.z.to_radians()));
        for c in Channel::ALL {
            let [x1, y1, x2, y2] = k.interpolation.curve(c).to_bytes();
            out.put_slice(&[x1, x2, y1, y2]);
        }
        out.put_u32_le(k.fov.round().max(0.0) as u32);
        out.put_u8(0);
    }
    out
}

fn read_bone(buf: &mut &[u8]) -> BoneKeyframe {
    let name = trim_nul(&buf[..BONE_NAME_LEN]).to_vec();
    buf.advance(BONE_NAME_LEN);
    let frame = buf.get_u32_le();
    let position = read_vec3(buf);
    let rotation = Quat::from_xyzw(buf.get_f32_le(), buf.get_f32_le(), buf.get_f32_le(), buf.get_f32_le());
    let mut raw = [0u8; 64];
    buf.copy_to_slice(&mut raw);
    // Per channel i: x1 at i, y1 at i+4, x2 at i+8, y2 at i+12.
    let curve = |i: usize| BezierCurve::from_bytes(raw[i], raw[i + 4], raw[i + 8], raw[i + 12]);
    let interpolation = BoneInterpolation { x: curve(0), y: curve(1), z: curve(2), rotation: curve(3) };
    BoneKeyframe { name, frame, position, rotation, interpolation }
}

fn read_camera(buf: &mut &[u8]) -> CameraKeyframe {
    let frame = buf.get_u32_le();
    let distance = buf.get_f32_le();
    let position = read_vec3(buf);
    let radians = read_vec3(buf);
    let mut raw = [0u8; 24];
    buf.copy_to_slice(&mut raw);
    let mut interpolation = CameraInterpolation::default();
    for (i, c) in Channel::ALL.into_iter().enumerate() {
        // Camera groups are [x1, x2, y1, y2].
        let g = &raw[i * 4..i * 4 + 4];
        interpolation.set(c, BezierCurve::from_bytes(g[0], g[2], g[1], g[3]));
    }
    let fov = buf.get_u32_le() as f32;
    let _perspective = buf.get_u8();
    CameraKeyframe {
        frame,
        position,
        rotation: Vec3::new(radians.x.to_degrees(), radians.y.to_degrees(), radians.z.to_degrees()),
        distance,
        fov,
        interpolation,
    }
}

// Reads a section's record count and checks its records are all present.
fn section(buf: &mut &[u8], record_len: usize, what: &'static str) -> Result<Option<usize>, CurveError> {
    if buf.remaining() < 4 { return Ok(None); }
    let count = buf.get_u32_le() as usize;
    let bytes = count.checked_mul(record_len).ok_or(CurveError::Truncated { what })?;
    ensure(buf, bytes, what)?;
    Ok(Some(count))
}

fn ensure(buf: &[u8], len: usize, what: &'static str) -> Result<(), CurveError> {
    if buf.remaining() < len { Err(CurveError::Truncated { what }) } else { Ok(()) }
}

fn read_vec3(buf: &mut &[u8]) -> Vec3 { Vec3::new(buf.get_f32_le(), buf.get_f32_le(), buf.get_f32_le()) }

fn put_vec3(out: &mut Vec<u8>, v: Vec3) {
    out.put_f32_le(v.x);
    out.put_f32_le(v.y);
    out.put_f32_le(v.z);
}

fn put_padded(out: &mut Vec<u8>, bytes: &[u8], len: usize) {
    let n = bytes.len().min(len);
    out.put_slice(&bytes[..n]);
    out.put_bytes(0, len - n);
}

fn trim_nul(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    &bytes[..end]
}
