//! Assembles parsed input files into translations and commentaries.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::audio::{default_registry, AudioLinks, AudioRegistry};
use crate::book_order::{is_known_language, BookId};
use crate::error::{DatasetError, ParseError};
use crate::input::{
    parse_input_file, InputCommentaryMetadata, InputFile, InputMetadata, InputTranslationMetadata, ParsedInput,
    TextDirection,
};
use crate::logger::Log;
use crate::settings::GenerationSettings;
use crate::types::{Chapter, CommentaryChapterNode, CommentaryParseTree, CommentaryProfileNode, ParseTree, RootContent};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Translation {
    pub id: String,
    pub name: String,
    pub english_name: String,
    pub short_name: String,
    pub website: String,
    pub license_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_notes: Option<String>,
    pub language: String,
    pub text_direction: TextDirection,
}

impl From<&InputTranslationMetadata> for Translation {
    fn from(m: &InputTranslationMetadata) -> Self {
        Translation {
            id: m.id.clone(),
            name: m.name.clone(),
            english_name: m.english_name.clone(),
            short_name: m.short_name.clone(),
            website: m.website.clone(),
            license_url: m.license_url.clone(),
            license_notes: m.license_notes.clone(),
            language: m.language.clone(),
            text_direction: m.direction,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commentary {
    pub id: String,
    pub name: String,
    pub english_name: String,
    pub website: String,
    pub license_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_notes: Option<String>,
    pub language: String,
    pub text_direction: TextDirection,
}

impl From<&InputCommentaryMetadata> for Commentary {
    fn from(m: &InputCommentaryMetadata) -> Self {
        Commentary {
            id: m.id.clone(),
            name: m.name.clone(),
            english_name: m.english_name.clone(),
            website: m.website.clone(),
            license_url: m.license_url.clone(),
            license_notes: m.license_notes.clone(),
            language: m.language.clone(),
            text_direction: m.direction,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetTranslation {
    #[serde(flatten)]
    pub translation: Translation,
    /// In canonical order.
    pub books: Vec<DatasetTranslationBook>,
}

impl DatasetTranslation {
    pub fn new(translation: Translation) -> Self {
        DatasetTranslation { translation, books: Vec::new() }
    }

    /// Insert `book` at its canonical position. A book that is already present
    /// takes the chapters it does not have yet; chapters it has are replaced.
    pub fn insert_book(&mut self, book: DatasetTranslationBook) {
        if let Some(existing) = self.books.iter_mut().find(|b| b.id == book.id) {
            for chapter in book.chapters {
                existing.insert_chapter(chapter);
            }
            return;
        }
        let idx = self.books.partition_point(|b| b.order < book.order);
        self.books.insert(idx, book);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetTranslationBook {
    pub id: BookId,
    pub name: String,
    pub common_name: String,
    pub title: Option<String>,
    pub order: u32,
    /// Sorted by chapter number.
    pub chapters: Vec<TranslationBookChapter>,
}

impl DatasetTranslationBook {
    fn insert_chapter(&mut self, chapter: TranslationBookChapter) {
        let number = chapter.chapter.number;
        match self.chapters.binary_search_by_key(&number, |c| c.chapter.number) {
            Ok(idx) => self.chapters[idx] = chapter,
            Err(idx) => self.chapters.insert(idx, chapter),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationBookChapter {
    pub chapter: Chapter,
    pub this_chapter_audio_links: AudioLinks,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetCommentary {
    #[serde(flatten)]
    pub commentary: Commentary,
    /// In the order the books were first seen.
    pub books: Vec<DatasetCommentaryBook>,
    #[serde(default)]
    pub profiles: Vec<CommentaryProfileNode>,
    /// Names of the input files folded into this commentary.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
}

impl DatasetCommentary {
    pub fn new(commentary: Commentary) -> Self {
        DatasetCommentary { commentary, books: Vec::new(), profiles: Vec::new(), sources: Vec::new() }
    }

    /// Fold `other` into this commentary. Books and chapters are matched by
    /// id and number, and verse notes of `other` are appended.
    ///
    /// Duplicates are detected per source, not per note: when every source
    /// of `other` was already folded in, nothing is added, so merging the same
    /// output twice is a no-op. Two files carrying the same note text both keep
    /// it. A commentary without sources is always treated as new content.
    pub fn merge(&mut self, other: DatasetCommentary) {
        if !other.sources.is_empty() && other.sources.iter().all(|s| self.sources.contains(s)) {
            return;
        }
        for source in other.sources {
            if !self.sources.contains(&source) {
                self.sources.push(source);
            }
        }
        for book in other.books {
            match self.books.iter_mut().find(|b| b.id == book.id) {
                Some(existing) => existing.merge(book),
                None => self.books.push(book),
            }
        }
        for profile in other.profiles {
            if !self.profiles.iter().any(|p| p.id == profile.id) {
                self.profiles.push(profile);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetCommentaryBook {
    pub id: BookId,
    pub name: String,
    pub common_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub introduction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub introduction_summary: Option<String>,
    pub order: u32,
    pub chapters: Vec<CommentaryBookChapter>,
}

impl DatasetCommentaryBook {
    fn merge(&mut self, other: DatasetCommentaryBook) {
        if self.introduction.is_none() {
            self.introduction = other.introduction;
        }
        if self.introduction_summary.is_none() {
            self.introduction_summary = other.introduction_summary;
        }
        for CommentaryBookChapter { chapter } in other.chapters {
            match self.chapters.iter_mut().find(|c| c.chapter.number == chapter.number) {
                Some(existing) => existing.chapter.merge(chapter),
                None => self.chapters.push(CommentaryBookChapter { chapter }),
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentaryBookChapter {
    pub chapter: CommentaryChapterData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentaryChapterData {
    pub number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub introduction: Option<String>,
    pub content: Vec<CommentaryVerse>,
}

impl CommentaryChapterData {
    fn merge(&mut self, other: CommentaryChapterData) {
        if self.introduction.is_none() {
            self.introduction = other.introduction;
        }
        for verse in other.content {
            match self.content.iter_mut().find(|v| v.number == verse.number) {
                Some(existing) => existing.content.extend(verse.content),
                None => self.content.push(verse),
            }
        }
    }
}

impl From<CommentaryChapterNode> for CommentaryChapterData {
    fn from(node: CommentaryChapterNode) -> Self {
        CommentaryChapterData {
            number: node.number,
            introduction: node.introduction,
            content: node
                .verses
                .into_iter()
                .map(|v| CommentaryVerse { number: v.number, content: v.content })
                .collect(),
        }
    }
}

/// Serialized as `{"type": "verse", "number": 1, "content": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "verse")]
pub struct CommentaryVerse {
    pub number: u32,
    pub content: Vec<String>,
}

/// A collection of per-verse data that is neither scripture text nor
/// commentary, such as cross references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub id: String,
    pub name: String,
    pub english_name: String,
    pub website: String,
    pub license_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_notes: Option<String>,
    pub language: String,
    #[serde(default)]
    pub text_direction: TextDirection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetDataset {
    #[serde(flatten)]
    pub dataset: Dataset,
    /// In canonical order.
    pub books: Vec<DatasetDatasetBook>,
}

impl DatasetDataset {
    pub fn new(dataset: Dataset) -> Self {
        DatasetDataset { dataset, books: Vec::new() }
    }

    /// Same rules as `DatasetTranslation::insert_book`.
    pub fn insert_book(&mut self, book: DatasetDatasetBook) {
        if let Some(existing) = self.books.iter_mut().find(|b| b.id == book.id) {
            for chapter in book.chapters {
                match existing.chapters.binary_search_by_key(&chapter.chapter.number, |c| c.chapter.number) {
                    Ok(idx) => existing.chapters[idx] = chapter,
                    Err(idx) => existing.chapters.insert(idx, chapter),
                }
            }
            return;
        }
        let idx = self.books.partition_point(|b| b.order < book.order);
        self.books.insert(idx, book);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetDatasetBook {
    pub id: BookId,
    pub order: u32,
    /// Sorted by chapter number.
    pub chapters: Vec<DatasetBookChapter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetBookChapter {
    pub chapter: DatasetChapterData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetChapterData {
    pub number: u32,
    pub content: Vec<DatasetChapterVerse>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetChapterVerse {
    pub verse: u32,
    pub references: Vec<DatasetReference>,
}

/// A verse, or verse range, that a dataset entry points to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetReference {
    pub book: BookId,
    pub chapter: u32,
    pub verse: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_verse: Option<u32>,
    /// Relevance, higher is closer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DatasetOutput {
    pub translations: Vec<DatasetTranslation>,
    #[serde(default)]
    pub commentaries: Vec<DatasetCommentary>,
    #[serde(default)]
    pub datasets: Vec<DatasetDataset>,
}

impl DatasetOutput {
    pub fn new() -> Self {
        DatasetOutput::default()
    }

    /// Fold a later partial dataset into this one, for datasets loaded in pages.
    pub fn merge(&mut self, other: DatasetOutput) {
        for translation in other.translations {
            match self.translations.iter_mut().find(|t| t.translation.id == translation.translation.id) {
                Some(existing) => {
                    for book in translation.books {
                        existing.insert_book(book);
                    }
                }
                None => self.translations.push(translation),
            }
        }
        for commentary in other.commentaries {
            match self.commentaries.iter_mut().find(|c| c.commentary.id == commentary.commentary.id) {
                Some(existing) => existing.merge(commentary),
                None => self.commentaries.push(commentary),
            }
        }
        for dataset in other.datasets {
            match self.datasets.iter_mut().find(|d| d.dataset.id == dataset.dataset.id) {
                Some(existing) => {
                    for book in dataset.books {
                        existing.insert_book(book);
                    }
                }
                None => self.datasets.push(dataset),
            }
        }
    }

    /// Load a serialized dataset page. Every book id must be one of the canonical books.
    pub fn from_json(json: &str) -> Result<DatasetOutput, DatasetError> {
        let value: Value = serde_json::from_str(json)?;
        for group in ["translations", "commentaries", "datasets"] {
            let entries = value.get(group).and_then(Value::as_array).into_iter().flatten();
            let books = entries.filter_map(|e| e.get("books").and_then(Value::as_array)).flatten();
            for book in books {
                let id = book.get("id").and_then(Value::as_str).unwrap_or_default();
                if BookId::from_str(id).is_err() {
                    return Err(DatasetError::UnknownBookOrder(id.to_string()));
                }
            }
        }
        Ok(serde_json::from_value(value)?)
    }
}

/// Parse every input file and group the results by translation and commentary.
///
/// A file that fails to parse is logged and skipped.
pub fn generate_dataset(
    files: &[InputFile],
    settings: &GenerationSettings,
    log: &dyn Log,
) -> Result<DatasetOutput, DatasetError> {
    let parsed: Vec<Result<ParsedInput, ParseError>> = if settings.parallel {
        files.par_iter().map(|file| parse_input_file(file, log)).collect()
    } else {
        files.iter().map(|file| parse_input_file(file, log)).collect()
    };

    let mut assembler = DatasetAssembler::new(default_registry(), log);
    for (file, result) in files.iter().zip(parsed) {
        match result {
            Ok(parsed) => assembler.add(file, parsed),
            Err(err) => log.error(&format!("Error occurred while parsing {}: {}", file.display_name(), err)),
        }
    }

    Ok(assembler.output)
}

struct DatasetAssembler<'a> {
    output: DatasetOutput,
    audio: AudioRegistry,
    log: &'a dyn Log,
    translations: HashMap<String, usize>,
    commentaries: HashMap<String, usize>,
    unknown_languages: HashSet<String>,
}

impl<'a> DatasetAssembler<'a> {
    fn new(audio: AudioRegistry, log: &'a dyn Log) -> Self {
        DatasetAssembler {
            output: DatasetOutput::new(),
            audio,
            log,
            translations: HashMap::new(),
            commentaries: HashMap::new(),
            unknown_languages: HashSet::new(),
        }
    }

    fn add(&mut self, file: &InputFile, parsed: ParsedInput) {
        match (&file.metadata, parsed) {
            (InputMetadata::Translation(metadata), ParsedInput::Scripture(trees)) => {
                for tree in trees {
                    self.add_book(file, metadata, tree);
                }
            }
            (InputMetadata::Commentary(metadata), ParsedInput::Commentary(tree)) => {
                self.add_commentary(file, metadata, tree);
            }
            _ => self.log.warn(&format!("File {} does not match its metadata", file.display_name())),
        }
    }

    fn check_language(&mut self, file: &InputFile, language: &str) {
        if !is_known_language(language) && self.unknown_languages.insert(language.to_string()) {
            self.log.warn(&format!(
                "File {} does not have a known language: {}",
                file.display_name(),
                language
            ));
        }
    }

    fn add_book(
        &mut self,
        file: &InputFile,
        metadata: &InputTranslationMetadata,
        tree: ParseTree,
    ) {
        let Some(id) = tree.id else {
            self.log.warn(&format!("File {} does not have a valid book id", file.display_name()));
            return;
        };
        self.check_language(file, &metadata.language);

        let localized = id.common_name(&metadata.language);
        let Some(name) = tree.header.clone().or(localized.map(str::to_string)).or(tree.title.clone()) else {
            self.log.warn(&format!("Book {} in {} does not have a name", id, file.display_name()));
            return;
        };
        let common_name = localized
            .map(str::to_string)
            .or(tree.header.clone())
            .or(tree.title.clone())
            .unwrap_or_else(|| id.to_string());

        let mut chapters: Vec<TranslationBookChapter> = tree
            .content
            .into_iter()
            .filter_map(|content| match content {
                RootContent::Chapter(chapter) => Some(chapter),
                RootContent::Heading(_) => None,
            })
            .map(|chapter| TranslationBookChapter {
                this_chapter_audio_links: self.audio.chapter_links(&metadata.id, id, chapter.number),
                chapter,
            })
            .collect();
        chapters.sort_by_key(|c| c.chapter.number);

        let book = DatasetTranslationBook {
            id,
            name,
            common_name,
            title: tree.title,
            order: id.order(),
            chapters,
        };

        let idx = match self.translations.get(&metadata.id) {
            Some(&idx) => idx,
            None => {
                self.output.translations.push(DatasetTranslation::new(Translation::from(metadata)));
                let idx = self.output.translations.len() - 1;
                self.translations.insert(metadata.id.clone(), idx);
                idx
            }
        };
        self.output.translations[idx].insert_book(book);
    }

    fn add_commentary(&mut self, file: &InputFile, metadata: &InputCommentaryMetadata, tree: CommentaryParseTree) {
        let language = metadata.language.as_str();
        let books = tree
            .books
            .into_iter()
            .map(|node| {
                let name = node.book.common_name(language).unwrap_or(node.book.english_name());
                let mut chapters: Vec<CommentaryBookChapter> = node
                    .chapters
                    .into_iter()
                    .map(|c| CommentaryBookChapter { chapter: c.into() })
                    .collect();
                chapters.sort_by_key(|c| c.chapter.number);
                DatasetCommentaryBook {
                    id: node.book,
                    name: name.to_string(),
                    common_name: name.to_string(),
                    introduction: node.introduction,
                    introduction_summary: node.introduction_summary,
                    order: node.book.order(),
                    chapters,
                }
            })
            .collect();

        let commentary = DatasetCommentary {
            commentary: Commentary::from(metadata),
            books,
            profiles: tree.profiles,
            sources: file.name.iter().cloned().collect(),
        };

        match self.commentaries.get(&metadata.id) {
            Some(&idx) => self.output.commentaries[idx].merge(commentary),
            None => {
                self.commentaries.insert(metadata.id.clone(), self.output.commentaries.len());
                self.output.commentaries.push(commentary);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verse(number: u32, content: &[&str]) -> CommentaryVerse {
        CommentaryVerse { number, content: content.iter().map(|s| s.to_string()).collect() }
    }

    fn chapter(number: u32, verses: Vec<CommentaryVerse>) -> CommentaryBookChapter {
        CommentaryBookChapter { chapter: CommentaryChapterData { number, introduction: None, content: verses } }
    }

    fn commentary(source: &str, verses: Vec<CommentaryVerse>) -> DatasetCommentary {
        let mut commentary = DatasetCommentary::new(Commentary {
            id: "notes".to_string(),
            name: "Notes".to_string(),
            english_name: "Notes".to_string(),
            website: "https://example.com".to_string(),
            license_url: "https://example.com/license".to_string(),
            license_notes: None,
            language: "eng".to_string(),
            text_direction: TextDirection::Ltr,
        });
        commentary.books.push(DatasetCommentaryBook {
            id: BookId::Genesis,
            name: "Genesis".to_string(),
            common_name: "Genesis".to_string(),
            introduction: None,
            introduction_summary: None,
            order: 1,
            chapters: vec![chapter(1, verses)],
        });
        commentary.sources.push(source.to_string());
        commentary
    }

    #[test]
    fn test_commentary_book_merge_appends_notes() {
        let mut book = commentary("a.csv", vec![verse(1, &["a"])]).books.remove(0);
        let mut other = book.clone();
        other.introduction = Some("intro".to_string());
        other.chapters = vec![chapter(1, vec![verse(1, &["b"]), verse(2, &["c"])]), chapter(2, vec![])];

        book.merge(other);

        assert_eq!(book.introduction.as_deref(), Some("intro"));
        assert_eq!(book.chapters.len(), 2);
        assert_eq!(book.chapters[0].chapter.content, vec![verse(1, &["a", "b"]), verse(2, &["c"])]);
    }

    #[test]
    fn test_commentary_merge_keeps_same_note_from_different_sources() {
        let mut merged = commentary("genesis.csv", vec![verse(1, &["See note."])]);
        merged.merge(commentary("genesis-extra.csv", vec![verse(1, &["See note."])]));

        assert_eq!(merged.sources, vec!["genesis.csv", "genesis-extra.csv"]);
        assert_eq!(merged.books[0].chapters[0].chapter.content, vec![verse(1, &["See note.", "See note."])]);
    }

    #[test]
    fn test_commentary_merge_skips_source_already_merged() {
        let mut merged = commentary("genesis.csv", vec![verse(1, &["a"])]);
        merged.merge(commentary("extra.csv", vec![verse(1, &["b"])]));
        let again = merged.clone();
        merged.merge(again);
        merged.merge(commentary("extra.csv", vec![verse(1, &["b"])]));

        assert_eq!(merged.books[0].chapters[0].chapter.content, vec![verse(1, &["a", "b"])]);
    }

    #[test]
    fn test_dataset_merge_replaces_chapters() {
        let dataset = Dataset {
            id: "refs".to_string(),
            name: "Refs".to_string(),
            english_name: "Refs".to_string(),
            website: "https://example.com".to_string(),
            license_url: "https://example.com/license".to_string(),
            license_notes: None,
            language: "eng".to_string(),
            text_direction: TextDirection::Ltr,
        };
        let reference = |verse| DatasetReference {
            book: BookId::John,
            chapter: 1,
            verse,
            end_verse: None,
            score: None,
        };
        let book = |id: BookId, number: u32, target: u32| DatasetDatasetBook {
            id,
            order: id.order(),
            chapters: vec![DatasetBookChapter {
                chapter: DatasetChapterData {
                    number,
                    content: vec![DatasetChapterVerse { verse: 1, references: vec![reference(target)] }],
                },
            }],
        };

        let mut first = DatasetOutput::new();
        let mut refs = DatasetDataset::new(dataset.clone());
        refs.insert_book(book(BookId::Exodus, 1, 1));
        refs.insert_book(book(BookId::Genesis, 2, 1));
        first.datasets.push(refs);

        let mut second = DatasetOutput::new();
        let mut refs = DatasetDataset::new(dataset);
        refs.insert_book(book(BookId::Genesis, 1, 5));
        refs.insert_book(book(BookId::Genesis, 2, 9));
        second.datasets.push(refs);

        first.merge(second);

        assert_eq!(first.datasets.len(), 1);
        let books = &first.datasets[0].books;
        assert_eq!(books.iter().map(|b| b.id).collect::<Vec<_>>(), vec![BookId::Genesis, BookId::Exodus]);
        let numbers: Vec<u32> = books[0].chapters.iter().map(|c| c.chapter.number).collect();
        assert_eq!(numbers, vec![1, 2]);
        assert_eq!(books[0].chapters[1].chapter.content[0].references[0].verse, 9);
    }

    #[test]
    fn test_commentary_verse_json_shape() {
        assert_eq!(
            serde_json::to_value(verse(3, &["note"])).unwrap(),
            serde_json::json!({ "type": "verse", "number": 3, "content": ["note"] })
        );
    }

    #[test]
    fn test_from_json_rejects_unknown_book() {
        let json = r#"{ "translations": [{ "id": "bsb", "books": [{ "id": "XYZ" }] }] }"#;
        let err = DatasetOutput::from_json(json).unwrap_err();
        assert!(matches!(err, DatasetError::UnknownBookOrder(id) if id == "XYZ"));
    }

    #[test]
    fn test_from_json_empty() {
        let dataset = DatasetOutput::from_json(r#"{ "translations": [] }"#).unwrap();
        assert!(dataset.translations.is_empty());
        assert!(dataset.commentaries.is_empty());
    }
}
