//! Projects a dataset onto the static JSON API: one object per output file,
//! with navigation links computed across books.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::audio::AudioLinks;
use crate::book_order::BookId;
use crate::dataset::{
    Commentary, CommentaryChapterData, Dataset, DatasetChapterData, DatasetCommentary, DatasetDataset, DatasetOutput,
    DatasetTranslation, Translation,
};
use crate::output::{OutputError, OutputFile};
use crate::reference::VerseRef;
use crate::settings::GenerationSettings;
use crate::types::Chapter;

lazy_static! {
    // Song of Songs -> Song_of_Songs, a/b -> a_b
    static ref RE_PATH_UNSAFE: Regex = Regex::new(r#"[<>:"/\\|?*\s]"#).unwrap();
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiTranslation {
    #[serde(flatten)]
    pub translation: Translation,
    pub available_formats: Vec<String>,
    pub list_of_books_api_link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complete_translation_api_link: Option<String>,
    pub number_of_books: usize,
    pub total_number_of_chapters: usize,
    pub total_number_of_verses: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_english_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiAvailableTranslations {
    pub translations: Vec<ApiTranslation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiTranslationBooks {
    pub translation: ApiTranslation,
    pub books: Vec<ApiTranslationBook>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiTranslationBook {
    pub id: BookId,
    pub name: String,
    pub common_name: String,
    pub title: Option<String>,
    pub order: u32,
    pub first_chapter_number: Option<u32>,
    pub first_chapter_api_link: Option<String>,
    pub last_chapter_number: Option<u32>,
    pub last_chapter_api_link: Option<String>,
    pub number_of_chapters: usize,
    pub total_number_of_verses: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiTranslationBookChapter {
    pub translation: ApiTranslation,
    pub book: ApiTranslationBook,
    pub chapter: Chapter,
    pub this_chapter_link: String,
    pub this_chapter_audio_links: AudioLinks,
    pub next_chapter_api_link: Option<String>,
    pub next_chapter_audio_links: Option<AudioLinks>,
    pub previous_chapter_api_link: Option<String>,
    pub previous_chapter_audio_links: Option<AudioLinks>,
    pub number_of_verses: usize,
}

/// A chapter recording to be downloaded to `link`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiTranslationBookChapterAudio {
    pub link: String,
    pub original_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiTranslationComplete {
    pub translation: ApiTranslation,
    pub books: Vec<ApiTranslationCompleteBook>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiTranslationCompleteBook {
    pub id: BookId,
    pub name: String,
    pub common_name: String,
    pub title: Option<String>,
    pub order: u32,
    pub number_of_chapters: usize,
    pub total_number_of_verses: usize,
    pub chapters: Vec<ApiTranslationCompleteChapter>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiTranslationCompleteChapter {
    pub chapter: Chapter,
    pub this_chapter_audio_links: AudioLinks,
    pub number_of_verses: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCommentary {
    #[serde(flatten)]
    pub commentary: Commentary,
    pub available_formats: Vec<String>,
    pub list_of_books_api_link: String,
    pub list_of_profiles_api_link: String,
    pub number_of_books: usize,
    pub total_number_of_chapters: usize,
    pub total_number_of_verses: usize,
    pub total_number_of_profiles: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_english_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiAvailableCommentaries {
    pub commentaries: Vec<ApiCommentary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiCommentaryBooks {
    pub commentary: ApiCommentary,
    pub books: Vec<ApiCommentaryBook>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCommentaryBook {
    pub id: BookId,
    pub name: String,
    pub common_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub introduction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub introduction_summary: Option<String>,
    pub order: u32,
    pub first_chapter_number: Option<u32>,
    pub first_chapter_api_link: Option<String>,
    pub last_chapter_number: Option<u32>,
    pub last_chapter_api_link: Option<String>,
    pub number_of_chapters: usize,
    pub total_number_of_verses: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCommentaryBookChapter {
    pub commentary: ApiCommentary,
    pub book: ApiCommentaryBook,
    pub chapter: CommentaryChapterData,
    pub this_chapter_link: String,
    pub next_chapter_api_link: Option<String>,
    pub previous_chapter_api_link: Option<String>,
    pub number_of_verses: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiCommentaryProfiles {
    pub commentary: ApiCommentary,
    pub profiles: Vec<ApiCommentaryProfile>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCommentaryProfile {
    pub id: String,
    pub subject: String,
    pub reference: Option<VerseRef>,
    pub this_profile_link: String,
    pub reference_chapter_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiCommentaryProfileContent {
    pub commentary: ApiCommentary,
    pub profile: ApiCommentaryProfile,
    pub content: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDataset {
    #[serde(flatten)]
    pub dataset: Dataset,
    pub available_formats: Vec<String>,
    pub list_of_books_api_link: String,
    pub number_of_books: usize,
    pub total_number_of_chapters: usize,
    pub total_number_of_verses: usize,
    pub total_number_of_references: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_english_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiAvailableDatasets {
    pub datasets: Vec<ApiDataset>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiDatasetBooks {
    pub dataset: ApiDataset,
    pub books: Vec<ApiDatasetBook>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDatasetBook {
    pub id: BookId,
    pub order: u32,
    pub first_chapter_number: Option<u32>,
    pub first_chapter_api_link: Option<String>,
    pub last_chapter_number: Option<u32>,
    pub last_chapter_api_link: Option<String>,
    pub number_of_chapters: usize,
    pub total_number_of_verses: usize,
    pub total_number_of_references: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDatasetBookChapter {
    pub dataset: ApiDataset,
    pub book: ApiDatasetBook,
    pub chapter: DatasetChapterData,
    pub this_chapter_link: String,
    pub next_chapter_api_link: Option<String>,
    pub previous_chapter_api_link: Option<String>,
    pub number_of_verses: usize,
    pub number_of_references: usize,
}

/// Every object of the generated API, grouped by kind.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiOutput {
    pub available_translations: ApiAvailableTranslations,
    pub translation_books: Vec<ApiTranslationBooks>,
    pub translation_book_chapters: Vec<ApiTranslationBookChapter>,
    pub translation_book_chapter_audio: Vec<ApiTranslationBookChapterAudio>,
    pub translation_complete: Vec<ApiTranslationComplete>,
    pub available_commentaries: ApiAvailableCommentaries,
    pub commentary_books: Vec<ApiCommentaryBooks>,
    pub commentary_book_chapters: Vec<ApiCommentaryBookChapter>,
    pub commentary_profiles: Vec<ApiCommentaryProfiles>,
    pub commentary_profile_contents: Vec<ApiCommentaryProfileContent>,
    pub available_datasets: ApiAvailableDatasets,
    pub dataset_books: Vec<ApiDatasetBooks>,
    pub dataset_book_chapters: Vec<ApiDatasetBookChapter>,
    pub path_prefix: String,
}

impl ApiOutput {
    fn new(path_prefix: &str) -> Self {
        ApiOutput {
            available_translations: ApiAvailableTranslations { translations: Vec::new() },
            translation_books: Vec::new(),
            translation_book_chapters: Vec::new(),
            translation_book_chapter_audio: Vec::new(),
            translation_complete: Vec::new(),
            available_commentaries: ApiAvailableCommentaries { commentaries: Vec::new() },
            commentary_books: Vec::new(),
            commentary_book_chapters: Vec::new(),
            commentary_profiles: Vec::new(),
            commentary_profile_contents: Vec::new(),
            available_datasets: ApiAvailableDatasets { datasets: Vec::new() },
            dataset_books: Vec::new(),
            dataset_book_chapters: Vec::new(),
            path_prefix: path_prefix.to_string(),
        }
    }
}

/// Native and English name of a language code.
pub fn language_names(language: &str) -> Option<(&'static str, &'static str)> {
    match language {
        "en" | "en-US" | "eng" => Some(("English", "English")),
        "arb" => Some(("العربية", "Arabic")),
        _ => None,
    }
}

pub fn generate_api(dataset: &DatasetOutput, settings: &GenerationSettings) -> ApiOutput {
    let mut api = ApiOutput::new(&settings.path_prefix);
    let links = Links { prefix: &settings.path_prefix, use_common_name: settings.use_common_name };

    for translation in &dataset.translations {
        add_translation(&mut api, &links, settings, translation);
    }
    for commentary in &dataset.commentaries {
        add_commentary(&mut api, &links, commentary);
    }
    for data in &dataset.datasets {
        add_dataset(&mut api, &links, data);
    }

    api
}

fn add_translation(api: &mut ApiOutput, links: &Links, settings: &GenerationSettings, dataset: &DatasetTranslation) {
    let tid = dataset.translation.id.as_str();
    let language = language_names(&dataset.translation.language);

    let books: Vec<ApiTranslationBook> = dataset
        .books
        .iter()
        .map(|book| {
            let book_link = links.book_link(book.id, &book.common_name);
            let first = book.chapters.first().map(|c| c.chapter.number);
            let last = book.chapters.last().map(|c| c.chapter.number);
            ApiTranslationBook {
                id: book.id,
                name: book.name.clone(),
                common_name: book.common_name.clone(),
                title: book.title.clone(),
                order: book.order,
                first_chapter_number: first,
                first_chapter_api_link: first.map(|n| links.chapter(tid, &book_link, n)),
                last_chapter_number: last,
                last_chapter_api_link: last.map(|n| links.chapter(tid, &book_link, n)),
                number_of_chapters: book.chapters.len(),
                total_number_of_verses: book.chapters.iter().map(|c| c.chapter.verse_count()).sum(),
            }
        })
        .collect();

    let api_translation = ApiTranslation {
        translation: dataset.translation.clone(),
        available_formats: vec!["json".to_string()],
        list_of_books_api_link: links.list_of_books(tid),
        complete_translation_api_link: settings.generate_complete_translations.then(|| links.complete(tid)),
        number_of_books: books.len(),
        total_number_of_chapters: books.iter().map(|b| b.number_of_chapters).sum(),
        total_number_of_verses: books.iter().map(|b| b.total_number_of_verses).sum(),
        language_name: language.map(|(native, _)| native.to_string()),
        language_english_name: language.map(|(_, english)| english.to_string()),
    };

    let mut pages: Vec<ApiTranslationBookChapter> = Vec::new();
    for (book, api_book) in dataset.books.iter().zip(&books) {
        let book_link = links.book_link(book.id, &book.common_name);
        for entry in &book.chapters {
            let number = entry.chapter.number;
            let mut audio = AudioLinks::new();
            for (reader, url) in &entry.this_chapter_audio_links {
                if settings.download_audio {
                    let link = links.chapter_audio(tid, &book_link, number, reader);
                    audio.insert(reader.clone(), link.clone());
                    api.translation_book_chapter_audio
                        .push(ApiTranslationBookChapterAudio { link, original_url: url.clone() });
                } else {
                    audio.insert(reader.clone(), url.clone());
                }
            }

            pages.push(ApiTranslationBookChapter {
                translation: api_translation.clone(),
                book: api_book.clone(),
                chapter: entry.chapter.clone(),
                this_chapter_link: links.chapter(tid, &book_link, number),
                this_chapter_audio_links: audio,
                next_chapter_api_link: None,
                next_chapter_audio_links: None,
                previous_chapter_api_link: None,
                previous_chapter_audio_links: None,
                number_of_verses: entry.chapter.verse_count(),
            });
        }
    }

    for i in 0..pages.len() {
        if i > 0 {
            pages[i].previous_chapter_api_link = Some(pages[i - 1].this_chapter_link.clone());
            pages[i].previous_chapter_audio_links = Some(pages[i - 1].this_chapter_audio_links.clone());
        }
        if i + 1 < pages.len() {
            pages[i].next_chapter_api_link = Some(pages[i + 1].this_chapter_link.clone());
            pages[i].next_chapter_audio_links = Some(pages[i + 1].this_chapter_audio_links.clone());
        }
    }

    if settings.generate_complete_translations {
        let complete_books = books
            .iter()
            .map(|book| ApiTranslationCompleteBook {
                id: book.id,
                name: book.name.clone(),
                common_name: book.common_name.clone(),
                title: book.title.clone(),
                order: book.order,
                number_of_chapters: book.number_of_chapters,
                total_number_of_verses: book.total_number_of_verses,
                chapters: pages
                    .iter()
                    .filter(|page| page.book.id == book.id)
                    .map(|page| ApiTranslationCompleteChapter {
                        chapter: page.chapter.clone(),
                        this_chapter_audio_links: page.this_chapter_audio_links.clone(),
                        number_of_verses: page.number_of_verses,
                    })
                    .collect(),
            })
            .collect();
        api.translation_complete
            .push(ApiTranslationComplete { translation: api_translation.clone(), books: complete_books });
    }

    api.available_translations.translations.push(api_translation.clone());
    api.translation_books.push(ApiTranslationBooks { translation: api_translation, books });
    api.translation_book_chapters.extend(pages);
}

fn add_commentary(api: &mut ApiOutput, links: &Links, dataset: &DatasetCommentary) {
    let cid = dataset.commentary.id.as_str();
    let language = language_names(&dataset.commentary.language);

    let books: Vec<ApiCommentaryBook> = dataset
        .books
        .iter()
        .map(|book| {
            let book_link = links.book_link(book.id, &book.common_name);
            let first = book.chapters.first().map(|c| c.chapter.number);
            let last = book.chapters.last().map(|c| c.chapter.number);
            ApiCommentaryBook {
                id: book.id,
                name: book.name.clone(),
                common_name: book.common_name.clone(),
                introduction: book.introduction.clone(),
                introduction_summary: book.introduction_summary.clone(),
                order: book.order,
                first_chapter_number: first,
                first_chapter_api_link: first.map(|n| links.commentary_chapter(cid, &book_link, n)),
                last_chapter_number: last,
                last_chapter_api_link: last.map(|n| links.commentary_chapter(cid, &book_link, n)),
                number_of_chapters: book.chapters.len(),
                total_number_of_verses: book.chapters.iter().map(|c| c.chapter.content.len()).sum(),
            }
        })
        .collect();

    let api_commentary = ApiCommentary {
        commentary: dataset.commentary.clone(),
        available_formats: vec!["json".to_string()],
        list_of_books_api_link: links.list_of_commentary_books(cid),
        list_of_profiles_api_link: links.profiles(cid),
        number_of_books: books.len(),
        total_number_of_chapters: books.iter().map(|b| b.number_of_chapters).sum(),
        total_number_of_verses: books.iter().map(|b| b.total_number_of_verses).sum(),
        total_number_of_profiles: dataset.profiles.len(),
        language_name: language.map(|(native, _)| native.to_string()),
        language_english_name: language.map(|(_, english)| english.to_string()),
    };

    let mut pages: Vec<ApiCommentaryBookChapter> = Vec::new();
    for (book, api_book) in dataset.books.iter().zip(&books) {
        let book_link = links.book_link(book.id, &book.common_name);
        for entry in &book.chapters {
            pages.push(ApiCommentaryBookChapter {
                commentary: api_commentary.clone(),
                book: api_book.clone(),
                chapter: entry.chapter.clone(),
                this_chapter_link: links.commentary_chapter(cid, &book_link, entry.chapter.number),
                next_chapter_api_link: None,
                previous_chapter_api_link: None,
                number_of_verses: entry.chapter.content.len(),
            });
        }
    }

    for i in 0..pages.len() {
        if i > 0 {
            pages[i].previous_chapter_api_link = Some(pages[i - 1].this_chapter_link.clone());
        }
        if i + 1 < pages.len() {
            pages[i].next_chapter_api_link = Some(pages[i + 1].this_chapter_link.clone());
        }
    }

    let mut profiles = Vec::with_capacity(dataset.profiles.len());
    for profile in &dataset.profiles {
        let api_profile = ApiCommentaryProfile {
            id: profile.id.clone(),
            subject: profile.subject.clone(),
            reference: profile.reference.clone(),
            this_profile_link: links.profile(cid, &profile.id),
            reference_chapter_link: profile
                .reference
                .as_ref()
                .map(|r| links.commentary_chapter(cid, r.book.as_str(), r.chapter)),
        };
        api.commentary_profile_contents.push(ApiCommentaryProfileContent {
            commentary: api_commentary.clone(),
            profile: api_profile.clone(),
            content: profile.content.clone(),
        });
        profiles.push(api_profile);
    }

    api.available_commentaries.commentaries.push(api_commentary.clone());
    api.commentary_books.push(ApiCommentaryBooks { commentary: api_commentary.clone(), books });
    api.commentary_profiles.push(ApiCommentaryProfiles { commentary: api_commentary, profiles });
    api.commentary_book_chapters.extend(pages);
}

/// Chapter links of a dataset always use book ids.
fn add_dataset(api: &mut ApiOutput, links: &Links, dataset: &DatasetDataset) {
    let did = dataset.dataset.id.as_str();
    let language = language_names(&dataset.dataset.language);

    let books: Vec<ApiDatasetBook> = dataset
        .books
        .iter()
        .map(|book| {
            let first = book.chapters.first().map(|c| c.chapter.number);
            let last = book.chapters.last().map(|c| c.chapter.number);
            ApiDatasetBook {
                id: book.id,
                order: book.order,
                first_chapter_number: first,
                first_chapter_api_link: first.map(|n| links.dataset_chapter(did, book.id, n)),
                last_chapter_number: last,
                last_chapter_api_link: last.map(|n| links.dataset_chapter(did, book.id, n)),
                number_of_chapters: book.chapters.len(),
                total_number_of_verses: book.chapters.iter().map(|c| c.chapter.content.len()).sum(),
                total_number_of_references: book.chapters.iter().map(|c| reference_count(&c.chapter)).sum(),
            }
        })
        .collect();

    let api_dataset = ApiDataset {
        dataset: dataset.dataset.clone(),
        available_formats: vec!["json".to_string()],
        list_of_books_api_link: links.list_of_dataset_books(did),
        number_of_books: books.len(),
        total_number_of_chapters: books.iter().map(|b| b.number_of_chapters).sum(),
        total_number_of_verses: books.iter().map(|b| b.total_number_of_verses).sum(),
        total_number_of_references: books.iter().map(|b| b.total_number_of_references).sum(),
        language_name: language.map(|(native, _)| native.to_string()),
        language_english_name: language.map(|(_, english)| english.to_string()),
    };

    let mut pages: Vec<ApiDatasetBookChapter> = Vec::new();
    for (book, api_book) in dataset.books.iter().zip(&books) {
        for entry in &book.chapters {
            pages.push(ApiDatasetBookChapter {
                dataset: api_dataset.clone(),
                book: api_book.clone(),
                chapter: entry.chapter.clone(),
                this_chapter_link: links.dataset_chapter(did, book.id, entry.chapter.number),
                next_chapter_api_link: None,
                previous_chapter_api_link: None,
                number_of_verses: entry.chapter.content.len(),
                number_of_references: reference_count(&entry.chapter),
            });
        }
    }

    for i in 0..pages.len() {
        if i > 0 {
            pages[i].previous_chapter_api_link = Some(pages[i - 1].this_chapter_link.clone());
        }
        if i + 1 < pages.len() {
            pages[i].next_chapter_api_link = Some(pages[i + 1].this_chapter_link.clone());
        }
    }

    api.available_datasets.datasets.push(api_dataset.clone());
    api.dataset_books.push(ApiDatasetBooks { dataset: api_dataset, books });
    api.dataset_book_chapters.extend(pages);
}

fn reference_count(chapter: &DatasetChapterData) -> usize {
    chapter.content.iter().map(|v| v.references.len()).sum()
}

/// Every output file of `api`, in a fixed order: translation listings,
/// chapters, audio, complete translations, the commentary files, then the
/// dataset files when there are datasets.
pub fn generate_files(api: &ApiOutput) -> Result<Vec<OutputFile>, OutputError> {
    let mut files = Vec::new();
    let prefix = &api.path_prefix;

    files.push(OutputFile::json(
        format!("{}/api/available_translations.json", prefix),
        &api.available_translations,
        true,
    )?);
    for books in &api.translation_books {
        files.push(OutputFile::json(&books.translation.list_of_books_api_link, books, false)?);
    }
    for chapter in &api.translation_book_chapters {
        files.push(OutputFile::json(&chapter.this_chapter_link, chapter, false)?);
    }
    for audio in &api.translation_book_chapter_audio {
        files.push(OutputFile::download(&audio.link, &audio.original_url));
    }
    for complete in &api.translation_complete {
        if let Some(link) = &complete.translation.complete_translation_api_link {
            files.push(OutputFile::json(link, complete, false)?);
        }
    }

    files.push(OutputFile::json(
        format!("{}/api/available_commentaries.json", prefix),
        &api.available_commentaries,
        true,
    )?);
    for books in &api.commentary_books {
        files.push(OutputFile::json(&books.commentary.list_of_books_api_link, books, false)?);
    }
    for profiles in &api.commentary_profiles {
        files.push(OutputFile::json(&profiles.commentary.list_of_profiles_api_link, profiles, false)?);
    }
    for content in &api.commentary_profile_contents {
        files.push(OutputFile::json(&content.profile.this_profile_link, content, false)?);
    }
    for chapter in &api.commentary_book_chapters {
        files.push(OutputFile::json(&chapter.this_chapter_link, chapter, false)?);
    }

    if !api.available_datasets.datasets.is_empty() {
        files.push(OutputFile::json(
            format!("{}/api/available_datasets.json", prefix),
            &api.available_datasets,
            true,
        )?);
    }
    for books in &api.dataset_books {
        files.push(OutputFile::json(&books.dataset.list_of_books_api_link, books, false)?);
    }
    for chapter in &api.dataset_book_chapters {
        files.push(OutputFile::json(&chapter.this_chapter_link, chapter, false)?);
    }

    Ok(files)
}

/// `generate_api` followed by `generate_files`.
pub fn generate_output_files(
    dataset: &DatasetOutput,
    settings: &GenerationSettings,
) -> Result<Vec<OutputFile>, OutputError> {
    generate_files(&generate_api(dataset, settings))
}

pub fn replace_spaces_with_underscores(s: &str) -> String {
    RE_PATH_UNSAFE.replace_all(s, "_").into_owned()
}

struct Links<'a> {
    prefix: &'a str,
    use_common_name: bool,
}

impl Links<'_> {
    fn book_link(&self, id: BookId, common_name: &str) -> String {
        if self.use_common_name { common_name.to_string() } else { id.to_string() }
    }

    fn list_of_books(&self, tid: &str) -> String {
        format!("{}/api/{}/books.json", self.prefix, tid)
    }

    fn complete(&self, tid: &str) -> String {
        format!("{}/api/{}/complete.json", self.prefix, tid)
    }

    fn chapter(&self, tid: &str, book_link: &str, chapter: u32) -> String {
        format!("{}/api/{}/{}/{}.json", self.prefix, tid, replace_spaces_with_underscores(book_link), chapter)
    }

    fn chapter_audio(&self, tid: &str, book_link: &str, chapter: u32, reader: &str) -> String {
        format!(
            "{}/api/{}/{}/{}.{}.mp3",
            self.prefix,
            tid,
            replace_spaces_with_underscores(book_link),
            chapter,
            reader
        )
    }

    fn list_of_commentary_books(&self, cid: &str) -> String {
        format!("{}/api/c/{}/books.json", self.prefix, cid)
    }

    fn commentary_chapter(&self, cid: &str, book_link: &str, chapter: u32) -> String {
        format!("{}/api/c/{}/{}/{}.json", self.prefix, cid, replace_spaces_with_underscores(book_link), chapter)
    }

    fn profiles(&self, cid: &str) -> String {
        format!("{}/api/c/{}/profiles.json", self.prefix, cid)
    }

    fn profile(&self, cid: &str, profile_id: &str) -> String {
        format!("{}/api/c/{}/profiles/{}.json", self.prefix, cid, replace_spaces_with_underscores(profile_id))
    }

    fn list_of_dataset_books(&self, did: &str) -> String {
        format!("{}/api/d/{}/books.json", self.prefix, did)
    }

    fn dataset_chapter(&self, did: &str, book: BookId, chapter: u32) -> String {
        format!("{}/api/d/{}/{}/{}.json", self.prefix, did, book, chapter)
    }
}
