//! Slide extraction from a PPTX archive.

use std::collections::HashMap;
use std::io::{Read, Seek};

use deckreel_core::{
    mime_type_for_path, Error, NoProgress, Progress, Result, SlideImage, SlideRecord,
};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::archive::PptxArchive;

/// Extracts per-slide text and images from a PPTX archive.
///
/// Slides are found by probing `ppt/slides/slide1.xml`, `slide2.xml`, ...
/// and stopping at the first missing position; the container declares no
/// slide count of its own that this relies on.
#[derive(Debug, Clone)]
pub struct SlideExtractor {
    include_thumbnails: bool,
}

impl SlideExtractor {
    /// Create an extractor that also attaches slide thumbnails when present.
    pub fn new() -> Self {
        Self {
            include_thumbnails: true,
        }
    }

    /// Enable or disable thumbnail lookup.
    pub fn with_thumbnails(mut self, include: bool) -> Self {
        self.include_thumbnails = include;
        self
    }

    /// Extract all slides carrying text or images.
    pub fn extract<R: Read + Seek>(&self, archive: &mut PptxArchive<R>) -> Result<Vec<SlideRecord>> {
        self.extract_with_progress(archive, &NoProgress)
    }

    /// Extract all slides, reporting each slide as it is parsed.
    pub fn extract_with_progress<R: Read + Seek>(
        &self,
        archive: &mut PptxArchive<R>,
        progress: &dyn Progress,
    ) -> Result<Vec<SlideRecord>> {
        let mut slides = Vec::new();

        for slide_number in 1.. {
            let Some(markup) = archive.read_text(&slide_path(slide_number))? else {
                log::debug!("No slide at position {}, stopping", slide_number);
                break;
            };

            progress.message(&format!("Parsing slide {}...", slide_number));
            let slide = self.parse_slide(archive, slide_number, &markup)?;

            if slide.has_content() {
                slides.push(slide);
            } else {
                log::debug!("Dropping slide {} with no text or images", slide_number);
            }
        }

        if slides.is_empty() {
            return Err(Error::NoContentFound);
        }

        log::info!("Extracted {} slides", slides.len());
        Ok(slides)
    }

    /// Build the record for one slide from its markup and relationships.
    fn parse_slide<R: Read + Seek>(
        &self,
        archive: &mut PptxArchive<R>,
        slide_number: usize,
        markup: &str,
    ) -> Result<SlideRecord> {
        let mut slide = SlideRecord::new(slide_number);
        let content = parse_slide_markup(&slide_path(slide_number), markup)?;
        slide.text = content.runs.join(" ").trim().to_string();

        let rels_path = slide_rels_path(slide_number);
        let image_rels = match archive.read_text(&rels_path)? {
            Some(xml) => parse_image_relationships(&rels_path, &xml)?,
            None => HashMap::new(),
        };

        for embed_id in &content.image_refs {
            let Some(media_path) = image_rels.get(embed_id) else {
                log::debug!("Slide {}: unresolved image reference {}", slide_number, embed_id);
                continue;
            };
            match archive.read_binary(media_path)? {
                Some(bytes) => {
                    slide.push_image(SlideImage::from_bytes(&bytes, mime_type_for_path(media_path)));
                }
                None => {
                    log::debug!("Slide {}: image target {} not in archive", slide_number, media_path);
                }
            }
        }

        if self.include_thumbnails {
            let path = thumbnail_path(slide_number);
            if let Some(bytes) = archive.read_binary(&path)? {
                slide.thumbnail = Some(SlideImage::from_bytes(&bytes, mime_type_for_path(&path)));
            }
        }

        Ok(slide)
    }
}

impl Default for SlideExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Open the given file bytes and extract all slides with default settings.
pub fn extract_slides(bytes: Vec<u8>) -> Result<Vec<SlideRecord>> {
    let mut archive = PptxArchive::open(bytes)?;
    SlideExtractor::new().extract(&mut archive)
}

fn slide_path(slide_number: usize) -> String {
    format!("ppt/slides/slide{}.xml", slide_number)
}

fn slide_rels_path(slide_number: usize) -> String {
    format!("ppt/slides/_rels/slide{}.xml.rels", slide_number)
}

fn thumbnail_path(slide_number: usize) -> String {
    format!("ppt/thumbnails/thumbnail{}.jpeg", slide_number)
}

/// Text runs and image references of one slide, in document order.
#[derive(Debug, Default)]
struct SlideMarkup {
    runs: Vec<String>,
    image_refs: Vec<String>,
}

/// Collect `a:t` run text and `a:blip` embed ids from slide XML.
fn parse_slide_markup(path: &str, xml: &str) -> Result<SlideMarkup> {
    let mut content = SlideMarkup::default();
    let mut reader = Reader::from_str(xml);
    let mut current_run: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"t" => current_run = Some(String::new()),
                    b"blip" => push_embed_id(e, &mut content.image_refs),
                    _ => {}
                }
            }
            Ok(Event::Empty(ref e)) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"t" => content.runs.push(String::new()),
                    b"blip" => push_embed_id(e, &mut content.image_refs),
                    _ => {}
                }
            }
            Ok(Event::Text(ref e)) => {
                if let Some(run) = current_run.as_mut() {
                    let text = e.unescape().map_err(|err| Error::corrupt(path, err))?;
                    run.push_str(&text);
                }
            }
            Ok(Event::CData(ref e)) => {
                if let Some(run) = current_run.as_mut() {
                    run.push_str(&String::from_utf8_lossy(e));
                }
            }
            Ok(Event::End(ref e)) => {
                let name = e.name();
                if local_name(name.as_ref()) == b"t" {
                    if let Some(run) = current_run.take() {
                        content.runs.push(run);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::corrupt(path, e)),
            _ => {}
        }
    }

    Ok(content)
}

fn push_embed_id(element: &BytesStart<'_>, image_refs: &mut Vec<String>) {
    for attr in element.attributes().flatten() {
        if local_name(attr.key.as_ref()) == b"embed" {
            image_refs.push(String::from_utf8_lossy(&attr.value).to_string());
        }
    }
}

/// Map relationship ids of image relationships to their media entry paths.
fn parse_image_relationships(path: &str, xml: &str) -> Result<HashMap<String, String>> {
    let mut rels = HashMap::new();
    let mut reader = Reader::from_str(xml);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.name().as_ref() == b"Relationship" =>
            {
                let mut rel_type = String::new();
                let mut target = String::new();
                let mut id = String::new();

                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"Type" => rel_type = String::from_utf8_lossy(&attr.value).to_string(),
                        b"Target" => target = String::from_utf8_lossy(&attr.value).to_string(),
                        b"Id" => id = String::from_utf8_lossy(&attr.value).to_string(),
                        _ => {}
                    }
                }

                if rel_type.ends_with("/image") && !id.is_empty() && !target.is_empty() {
                    rels.insert(id, media_path_for_target(&target));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::corrupt(path, e)),
            _ => {}
        }
    }

    Ok(rels)
}

/// Resolve a relationship target like `../media/image1.png` to `ppt/media/image1.png`.
fn media_path_for_target(target: &str) -> String {
    let file_name = target.rsplit('/').next().unwrap_or(target);
    format!("ppt/media/{}", file_name)
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}
