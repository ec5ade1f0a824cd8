use scripture_backend::input::{
    InputCommentaryMetadata, InputFile, InputFileType, InputMetadata, InputTranslationMetadata, TextDirection,
};

pub fn translation_metadata(id: &str, language: &str) -> InputMetadata {
    InputMetadata::Translation(InputTranslationMetadata {
        id: id.to_string(),
        name: format!("{} translation", id),
        english_name: format!("{} translation", id),
        short_name: id.to_uppercase(),
        website: "https://example.com".to_string(),
        license_url: "https://example.com/license".to_string(),
        license_notes: None,
        language: language.to_string(),
        direction: TextDirection::Ltr,
    })
}

#[allow(dead_code)]
pub fn commentary_metadata(id: &str) -> InputMetadata {
    InputMetadata::Commentary(InputCommentaryMetadata {
        id: id.to_string(),
        name: format!("{} commentary", id),
        english_name: format!("{} commentary", id),
        website: "https://example.com".to_string(),
        license_url: "https://example.com/license".to_string(),
        license_notes: None,
        language: "eng".to_string(),
        direction: TextDirection::Ltr,
    })
}

#[allow(dead_code)]
pub fn input_file(name: &str, file_type: InputFileType, metadata: InputMetadata, content: &str) -> InputFile {
    InputFile {
        name: Some(name.to_string()),
        file_type,
        metadata,
        content: content.to_string(),
        sha256: None,
    }
}

/// Genesis 1:1-2 in the markup dialect.
#[allow(dead_code)]
pub const GENESIS_MARKUP: &str = "<BN>GENESIS</BN>
<CN>CHAPTER 1</CN>
<SH>The Creation</SH>
<PM>{{01::1}}1<T>In the beginning God created the heavens and the earth.
<PM>{{01::1}}2<T>Now the earth was formless and void<$F<FN>01<FNC>1<FNV>2</FN>Or {a waste}$E>, and darkness was over the surface of the deep.
";

/// Exodus 1:1-2 in the markup dialect.
#[allow(dead_code)]
pub const EXODUS_MARKUP: &str = "<BN>EXODUS</BN>
<CN>CHAPTER 1</CN>
<SH>The Israelites Multiply in Egypt</SH>
<PM>{{02::1}}1<T>These are the names of the sons of Israel who went to Egypt with Jacob:
<V>{{02::1}}2<T>Reuben, Simeon, Levi, and Judah;
";
