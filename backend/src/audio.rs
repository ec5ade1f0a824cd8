//! Chapter audio links for translations with known recordings.

use std::collections::BTreeMap;

use crate::book_order::BookId;

/// Reader id to audio URL.
pub type AudioLinks = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioReader {
    pub id: String,
    /// Appended to the file name, `_G` in `BSB_01_Gen_001_G.mp3`.
    pub suffix: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioTranslation {
    /// Code used in file names, e.g. "BSB".
    pub code: String,
    pub readers: Vec<AudioReader>,
}

#[derive(Debug, Clone, Default)]
pub struct AudioRegistry {
    /// Keyed by lower-cased translation id.
    translations: BTreeMap<String, AudioTranslation>,
}

impl AudioRegistry {
    pub fn new() -> Self {
        AudioRegistry::default()
    }

    pub fn register(&mut self, translation_id: &str, readers: &[(&str, Option<&str>)]) {
        let translation = AudioTranslation {
            code: translation_id.to_uppercase(),
            readers: readers
                .iter()
                .map(|(id, suffix)| AudioReader {
                    id: id.to_string(),
                    suffix: suffix.map(str::to_string),
                })
                .collect(),
        };
        self.translations.insert(translation_id.to_lowercase(), translation);
    }

    /// Links for every reader of the translation; empty for unknown translations.
    pub fn chapter_links(&self, translation_id: &str, book: BookId, chapter: u32) -> AudioLinks {
        let Some(translation) = self.translations.get(&translation_id.to_lowercase()) else {
            return AudioLinks::new();
        };
        translation
            .readers
            .iter()
            .map(|reader| (reader.id.clone(), open_bible_url(&translation.code, reader, book, chapter)))
            .collect()
    }
}

/// The recordings published on openbible.com.
pub fn default_registry() -> AudioRegistry {
    let mut registry = AudioRegistry::new();
    registry.register("bsb", &[("gilbert", Some("G")), ("hays", Some("H")), ("souer", None)]);
    registry
}

fn open_bible_url(code: &str, reader: &AudioReader, book: BookId, chapter: u32) -> String {
    let mut url = format!(
        "https://openbible.com/audio/{}/{}_{:02}_{}_{:03}",
        reader.id,
        code,
        book.order(),
        capitalize(book.as_str()),
        chapter
    );
    if let Some(suffix) = &reader.suffix {
        url.push('_');
        url.push_str(suffix);
    }
    url.push_str(".mp3");
    url
}

/// Upper-case the first letter and lower-case the rest. A leading digit is
/// kept and the letter after it is upper-cased instead (`1SA` -> `1Sa`).
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };

    let mut out = String::with_capacity(s.len());
    if first.is_ascii_digit() {
        out.push(first);
        if let Some(second) = chars.next() {
            out.extend(second.to_uppercase());
        }
    } else {
        out.extend(first.to_uppercase());
    }
    out.extend(chars.flat_map(char::to_lowercase));
    out
}
