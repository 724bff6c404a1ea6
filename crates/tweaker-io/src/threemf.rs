//! 3MF reading and in-place reorientation.
//!
//! A 3MF file is a zip archive whose `*.model` part holds the geometry as XML.
//! Reading expands every build item into triangles in build space. Rewriting
//! leaves the geometry alone: each build item's `transform` is composed with
//! the chosen rotation, so materials, metadata and every other archive entry
//! survive untouched.
//!
//! Transforms use the 3MF row-vector convention. The attribute
//! `m00 m01 m02 m10 m11 m12 m20 m21 m22 m30 m31 m32` maps a point as
//! `[x y z 1] · M`.

use std::collections::HashSet;
use std::io::{Cursor, Read, Seek, Write};

use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use tracing::{debug, warn};
use tweaker::Rotation;
use tweaker_math::{Mat3, Point3, Vec3};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{IoError, Result};

/// Standard location of the model part.
const MODEL_PART: &str = "3D/3dmodel.model";

/// Metadata key carrying the support suggestion.
const SUPPORT_METADATA: &str = "supportstructure";

/// Affine transform in 3MF row-vector form: `p' = p · linear + translation`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Transform {
    linear: Mat3,
    translation: Vec3,
}

impl Transform {
    fn identity() -> Self {
        Self {
            linear: Mat3::identity(),
            translation: Vec3::zeros(),
        }
    }

    fn parse(s: &str) -> Result<Self> {
        let v: Vec<f64> = s
            .split_whitespace()
            .map(|t| {
                t.parse::<f64>()
                    .map_err(|e| IoError::ThreeMf(format!("invalid transform entry {t:?}: {e}")))
            })
            .collect::<Result<_>>()?;
        if v.len() != 12 {
            return Err(IoError::ThreeMf(format!(
                "transform needs 12 entries, got {}",
                v.len()
            )));
        }
        Ok(Self {
            linear: Mat3::new(v[0], v[1], v[2], v[3], v[4], v[5], v[6], v[7], v[8]),
            translation: Vec3::new(v[9], v[10], v[11]),
        })
    }

    fn apply(&self, p: &Point3) -> Point3 {
        Point3::from(self.linear.transpose() * p.coords + self.translation)
    }

    /// This transform followed by a row-vector rotation `r`.
    fn then_rotate(&self, r: &Mat3) -> Self {
        Self {
            linear: self.linear * r,
            translation: r.transpose() * self.translation,
        }
    }

    fn to_attribute(&self) -> String {
        let m = &self.linear;
        let t = &self.translation;
        [
            m[(0, 0)], m[(0, 1)], m[(0, 2)],
            m[(1, 0)], m[(1, 1)], m[(1, 2)],
            m[(2, 0)], m[(2, 1)], m[(2, 2)],
            t.x, t.y, t.z,
        ]
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ")
    }
}

fn zip_error(e: zip::result::ZipError) -> IoError {
    IoError::ThreeMf(format!("invalid archive: {e}"))
}

fn xml_error(e: impl std::fmt::Display) -> IoError {
    IoError::ThreeMf(format!("XML error: {e}"))
}

/// Name of the model part: the standard path if present, else the first
/// `*.model` entry.
fn model_part_name<R: Read + Seek>(archive: &ZipArchive<R>) -> Result<String> {
    let mut fallback = None;
    for name in archive.file_names() {
        if name.eq_ignore_ascii_case(MODEL_PART) {
            return Ok(name.to_string());
        }
        if fallback.is_none() && name.to_ascii_lowercase().ends_with(".model") {
            fallback = Some(name.to_string());
        }
    }
    fallback.ok_or_else(|| IoError::ThreeMf("archive does not contain a model part".into()))
}

fn read_model_part<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<(String, String)> {
    let name = model_part_name(archive)?;
    let mut file = archive.by_name(&name).map_err(zip_error)?;
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    Ok((name, content))
}

/// Value of the attribute whose local name is `name`.
fn attribute(e: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes().flatten() {
        if attr.key.local_name().as_ref() == name {
            let value = attr.unescape_value().map_err(xml_error)?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn required<T>(e: &BytesStart<'_>, name: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let element = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
    let value = attribute(e, name.as_bytes())?
        .ok_or_else(|| IoError::ThreeMf(format!("<{element}> is missing attribute {name}")))?;
    value
        .trim()
        .parse()
        .map_err(|err| IoError::ThreeMf(format!("<{element}> has invalid {name} {value:?}: {err}")))
}

/// Objects and build items collected from a model part.
#[derive(Default)]
struct ModelContents {
    /// Mesh objects in document order, expanded to triangle points.
    objects: Vec<(String, Vec<Point3>)>,
    /// Objects made of components, which are not expanded.
    skipped: HashSet<String>,
    items: Vec<(String, Transform)>,
    has_build: bool,
}

/// Object being read.
#[derive(Default)]
struct ObjectState {
    id: String,
    vertices: Vec<Point3>,
    triangles: Vec<[usize; 3]>,
    has_components: bool,
}

impl ModelContents {
    fn finish_object(&mut self, object: ObjectState) -> Result<()> {
        if object.triangles.is_empty() && object.has_components {
            warn!(object = %object.id, "skipping 3MF object built from components");
            self.skipped.insert(object.id);
            return Ok(());
        }
        let mut points = Vec::with_capacity(object.triangles.len() * 3);
        for tri in &object.triangles {
            for &i in tri {
                let v = object.vertices.get(i).ok_or_else(|| {
                    IoError::ThreeMf(format!(
                        "object {}: triangle references vertex {i} of {}",
                        object.id,
                        object.vertices.len()
                    ))
                })?;
                points.push(*v);
            }
        }
        self.objects.push((object.id, points));
        Ok(())
    }

    /// Triangles of every build item in build space, or of every object when
    /// the model has no build section.
    fn into_points(self) -> Result<Vec<Point3>> {
        let mut points = Vec::new();
        if !self.has_build {
            for (_, object) in self.objects {
                points.extend(object);
            }
        } else {
            for (id, transform) in &self.items {
                match self.objects.iter().find(|(oid, _)| oid == id) {
                    Some((_, object)) => points.extend(object.iter().map(|p| transform.apply(p))),
                    None if self.skipped.contains(id) => {}
                    None => {
                        return Err(IoError::ThreeMf(format!(
                            "build item references unknown object {id}"
                        )))
                    }
                }
            }
        }
        if points.is_empty() {
            return Err(IoError::ThreeMf("model contains no mesh triangles".into()));
        }
        Ok(points)
    }
}

fn parse_model(content: &str) -> Result<Vec<Point3>> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut contents = ModelContents::default();
    let mut object: Option<ObjectState> = None;

    loop {
        let event = reader.read_event().map_err(xml_error)?;
        let (e, empty) = match event {
            Event::Start(e) => (e, false),
            Event::Empty(e) => (e, true),
            Event::End(e) => {
                if e.local_name().as_ref() == b"object" {
                    if let Some(done) = object.take() {
                        contents.finish_object(done)?;
                    }
                }
                continue;
            }
            Event::Eof => break,
            _ => continue,
        };

        match e.local_name().as_ref() {
            b"object" => {
                let state = ObjectState {
                    id: required(&e, "id")?,
                    ..Default::default()
                };
                if empty {
                    contents.finish_object(state)?;
                } else {
                    object = Some(state);
                }
            }
            b"vertex" => {
                if let Some(state) = object.as_mut() {
                    state.vertices.push(Point3::new(
                        required(&e, "x")?,
                        required(&e, "y")?,
                        required(&e, "z")?,
                    ));
                }
            }
            b"triangle" => {
                if let Some(state) = object.as_mut() {
                    state.triangles.push([
                        required(&e, "v1")?,
                        required(&e, "v2")?,
                        required(&e, "v3")?,
                    ]);
                }
            }
            b"components" | b"component" => {
                if let Some(state) = object.as_mut() {
                    state.has_components = true;
                }
            }
            b"build" => contents.has_build = true,
            b"item" => {
                let transform = match attribute(&e, b"transform")? {
                    Some(s) => Transform::parse(&s)?,
                    None => Transform::identity(),
                };
                contents.items.push((required(&e, "objectid")?, transform));
            }
            _ => {}
        }
    }

    debug!(
        objects = contents.objects.len(),
        items = contents.items.len(),
        "parsed 3MF model"
    );
    contents.into_points()
}

/// Read a 3MF archive into a flat triangle point stream in build space.
pub fn parse_3mf(bytes: &[u8]) -> Result<Vec<Point3>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(zip_error)?;
    let (_, content) = read_model_part(&mut archive)?;
    parse_model(&content)
}

fn write_event<'a>(writer: &mut Writer<Cursor<Vec<u8>>>, event: Event<'a>) -> Result<()> {
    writer.write_event(event).map_err(xml_error)
}

fn is_support_metadata(e: &BytesStart<'_>) -> bool {
    e.local_name().as_ref() == b"metadata"
        && matches!(attribute(e, b"name"), Ok(Some(name)) if name == SUPPORT_METADATA)
}

/// Copy of an `<item>` whose transform is followed by `rotation`.
fn rotated_item(e: &BytesStart<'_>, rotation: &Mat3) -> Result<BytesStart<'static>> {
    let transform = match attribute(e, b"transform")? {
        Some(s) => Transform::parse(&s)?,
        None => Transform::identity(),
    };
    let kept: Vec<Attribute<'_>> = e
        .attributes()
        .flatten()
        .filter(|a| a.key.local_name().as_ref() != b"transform")
        .collect();

    let mut item = e.clone().into_owned();
    item.clear_attributes();
    item.extend_attributes(kept);
    let value = transform.then_rotate(rotation).to_attribute();
    item.push_attribute(("transform", value.as_str()));
    Ok(item)
}

fn rewrite_model(content: &str, rotation: &Mat3, support: bool) -> Result<String> {
    let mut reader = Reader::from_str(content);
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    // Depth inside a replaced supportstructure element
    let mut skipping = 0usize;

    loop {
        let event = reader.read_event().map_err(xml_error)?;
        if skipping > 0 {
            match event {
                Event::Start(_) => skipping += 1,
                Event::End(_) => skipping -= 1,
                Event::Eof => break,
                _ => {}
            }
            continue;
        }
        match event {
            Event::Eof => break,
            Event::Start(e) if e.local_name().as_ref() == b"model" => {
                write_event(&mut writer, Event::Start(e))?;
                let mut meta = BytesStart::new("metadata");
                meta.push_attribute(("name", SUPPORT_METADATA));
                write_event(&mut writer, Event::Start(meta))?;
                let value = if support { "yes" } else { "no" };
                write_event(&mut writer, Event::Text(BytesText::new(value)))?;
                write_event(&mut writer, Event::End(BytesEnd::new("metadata")))?;
            }
            Event::Start(e) if is_support_metadata(&e) => skipping = 1,
            Event::Empty(e) if is_support_metadata(&e) => {}
            Event::Start(e) if e.local_name().as_ref() == b"item" => {
                write_event(&mut writer, Event::Start(rotated_item(&e, rotation)?))?;
            }
            Event::Empty(e) if e.local_name().as_ref() == b"item" => {
                write_event(&mut writer, Event::Empty(rotated_item(&e, rotation)?))?;
            }
            other => write_event(&mut writer, other)?,
        }
    }

    String::from_utf8(writer.into_inner().into_inner())
        .map_err(|e| IoError::ThreeMf(format!("rewritten model is not UTF-8: {e}")))
}

/// Rewrite a 3MF archive so every build item is rotated by `rotation`, and
/// record whether support structures are suggested.
///
/// Entries other than the model part are copied verbatim.
pub fn rewrite_3mf(source: &[u8], rotation: &Rotation, support: bool) -> Result<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(source)).map_err(zip_error)?;
    let (model_name, content) = read_model_part(&mut archive)?;
    let model = rewrite_model(&content, &rotation.matrix, support)?;

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for i in 0..archive.len() {
        let file = archive.by_index(i).map_err(zip_error)?;
        if file.name() == model_name {
            drop(file);
            zip.start_file(model_name.as_str(), options).map_err(zip_error)?;
            zip.write_all(model.as_bytes())?;
        } else {
            zip.raw_copy_file(file).map_err(zip_error)?;
        }
    }

    let out = zip.finish().map_err(zip_error)?;
    Ok(out.into_inner())
}
