//! Canonical book table
//!
//! Every per-book property (order, chapter count, names, OSIS abbreviation)
//! lives in the single `book_table!` invocation below, so adding a property
//! means adding a column and every lookup stays an exhaustive `match`.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ParseError;

macro_rules! book_table {
    ($( $variant:ident = $order:literal, $id:literal, $chapters:literal, $osis:literal, $english:literal, $arabic:literal; )+) => {
        /// One of the 66 canonical books. The discriminant is the canonical order.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u8)]
        pub enum BookId {
            $( $variant = $order, )+
        }

        impl BookId {
            /// All books in canonical order.
            pub const ALL: [BookId; 66] = [ $( BookId::$variant, )+ ];

            /// The 3-character id, e.g. "GEN", "1CO".
            pub fn as_str(&self) -> &'static str {
                match self { $( BookId::$variant => $id, )+ }
            }

            pub fn chapter_count(&self) -> u32 {
                match self { $( BookId::$variant => $chapters, )+ }
            }

            /// OSIS abbreviation, e.g. "Gen", "1Kgs".
            pub fn osis(&self) -> &'static str {
                match self { $( BookId::$variant => $osis, )+ }
            }

            /// English common name, e.g. "Song of Songs".
            pub fn english_name(&self) -> &'static str {
                match self { $( BookId::$variant => $english, )+ }
            }

            pub fn arabic_name(&self) -> &'static str {
                match self { $( BookId::$variant => $arabic, )+ }
            }
        }
    };
}

book_table! {
    Genesis = 1, "GEN", 50, "Gen", "Genesis", "التَّكوين";
    Exodus = 2, "EXO", 40, "Exod", "Exodus", "الخُرُوج";
    Leviticus = 3, "LEV", 27, "Lev", "Leviticus", "اللّاويِّين";
    Numbers = 4, "NUM", 36, "Num", "Numbers", "العَدَد";
    Deuteronomy = 5, "DEU", 34, "Deut", "Deuteronomy", "التَّثْنِيَة";
    Joshua = 6, "JOS", 24, "Josh", "Joshua", "يَشُوع";
    Judges = 7, "JDG", 21, "Judg", "Judges", "القُضاة";
    Ruth = 8, "RUT", 4, "Ruth", "Ruth", "راعُوث";
    FirstSamuel = 9, "1SA", 31, "1Sam", "1 Samuel", "صَمُوئيلَ الأوَّلُ";
    SecondSamuel = 10, "2SA", 24, "2Sam", "2 Samuel", "صموئيلَ الثّانِي";
    FirstKings = 11, "1KI", 22, "1Kgs", "1 Kings", "المُلُوكِ الأوَّلُ";
    SecondKings = 12, "2KI", 25, "2Kgs", "2 Kings", "المُلُوكِ الثّانِي";
    FirstChronicles = 13, "1CH", 29, "1Chr", "1 Chronicles", "أخبارِ الأيّامِ الأوّلُ";
    SecondChronicles = 14, "2CH", 36, "2Chr", "2 Chronicles", "أخبارِ الأيّامِ الثّانِي";
    Ezra = 15, "EZR", 10, "Ezra", "Ezra", "عَزْرا";
    Nehemiah = 16, "NEH", 13, "Neh", "Nehemiah", "نَحَمْيا";
    Esther = 17, "EST", 10, "Esth", "Esther", "أسْتِير";
    Job = 18, "JOB", 42, "Job", "Job", "أيُّوب";
    Psalms = 19, "PSA", 150, "Ps", "Psalms", "المَزامِير";
    Proverbs = 20, "PRO", 31, "Prov", "Proverbs", "الأمثال";
    Ecclesiastes = 21, "ECC", 12, "Eccl", "Ecclesiastes", "الجامِعَة";
    SongOfSongs = 22, "SNG", 8, "Song", "Song of Songs", "نَشِيدِ الأنشاد";
    Isaiah = 23, "ISA", 66, "Isa", "Isaiah", "إشَعْياء";
    Jeremiah = 24, "JER", 52, "Jer", "Jeremiah", "إرْمِيا";
    Lamentations = 25, "LAM", 5, "Lam", "Lamentations", "ﻣﺮﺍﺛﻲ ﺇﺭﻣﻴﺎ";
    Ezekiel = 26, "EZK", 48, "Ezek", "Ezekiel", "حِزْقِيال";
    Daniel = 27, "DAN", 12, "Dan", "Daniel", "دانيال";
    Hosea = 28, "HOS", 14, "Hos", "Hosea", "هُوشَع";
    Joel = 29, "JOL", 3, "Joel", "Joel", "يُوئيل";
    Amos = 30, "AMO", 9, "Amos", "Amos", "عامُوس";
    Obadiah = 31, "OBA", 1, "Obad", "Obadiah", "عُوبَدْيا";
    Jonah = 32, "JON", 4, "Jonah", "Jonah", "ﻳﻮﻧﺎﻥ";
    Micah = 33, "MIC", 7, "Mic", "Micah", "ميخا";
    Nahum = 34, "NAM", 3, "Nah", "Nahum", "ناحُوم";
    Habakkuk = 35, "HAB", 3, "Hab", "Habakkuk", "حَبَقُّوق";
    Zephaniah = 36, "ZEP", 3, "Zeph", "Zephaniah", "صَفَنْيا";
    Haggai = 37, "HAG", 2, "Hag", "Haggai", "حَجَّي";
    Zechariah = 38, "ZEC", 14, "Zech", "Zechariah", "زَكَريّا";
    Malachi = 39, "MAL", 4, "Mal", "Malachi", "مَلاخِي";
    Matthew = 40, "MAT", 28, "Matt", "Matthew", "ﻣﺘﻰ";
    Mark = 41, "MRK", 16, "Mark", "Mark", "مَرْقُس";
    Luke = 42, "LUK", 24, "Luke", "Luke", "لُوقا";
    John = 43, "JHN", 21, "John", "John", "يُوحَنّا";
    Acts = 44, "ACT", 28, "Acts", "Acts", "اعمال الرسل";
    Romans = 45, "ROM", 16, "Rom", "Romans", "ﺭﻭﻣﻴﺔ";
    FirstCorinthians = 46, "1CO", 16, "1Cor", "1 Corinthians", "ﻛﻮﺭﻧﺜﻮﺱ ﺍﻻﻭﻝ";
    SecondCorinthians = 47, "2CO", 13, "2Cor", "2 Corinthians", "ﻛﻮﺭﻧﺜﻮﺱ ﺍﻟﺜﺎﻧﻴﺔ";
    Galatians = 48, "GAL", 6, "Gal", "Galatians", "غَلاطِيَّة";
    Ephesians = 49, "EPH", 6, "Eph", "Ephesians", "أفَسُس";
    Philippians = 50, "PHP", 4, "Phil", "Philippians", "فِيلِبِّي";
    Colossians = 51, "COL", 4, "Col", "Colossians", "كُولُوسِي";
    FirstThessalonians = 52, "1TH", 5, "1Thess", "1 Thessalonians", "الرِّسالَةُ الأُولَى إلَى تَسالُونِيكِي";
    SecondThessalonians = 53, "2TH", 3, "2Thess", "2 Thessalonians", "الرِّسالَةُ الثّانيَةُ إلَى تَسالُونِيكِي";
    FirstTimothy = 54, "1TI", 6, "1Tim", "1 Timothy", "الرِّسالَةُ الأُولَى إلَى تِيمُوثاوُس";
    SecondTimothy = 55, "2TI", 4, "2Tim", "2 Timothy", "الرِّسالَةُ الثّانيَةُ إلَى تِيمُوثاوُس";
    Titus = 56, "TIT", 3, "Titus", "Titus", "تِيطُس";
    Philemon = 57, "PHM", 1, "Phlm", "Philemon", "فِلِيْمُون";
    Hebrews = 58, "HEB", 13, "Heb", "Hebrews", "العِبرانِيّين";
    James = 59, "JAS", 5, "Jas", "James", "يَعقُوب";
    FirstPeter = 60, "1PE", 5, "1Pet", "1 Peter", "رسالَةُ بُطرُسَ الأُولَى";
    SecondPeter = 61, "2PE", 3, "2Pet", "2 Peter", "رسالَةُ بُطرُسَ الثّانيَة";
    FirstJohn = 62, "1JN", 5, "1John", "1 John", "رسالَةُ يُوحَنّا الأُولَى";
    SecondJohn = 63, "2JN", 1, "2John", "2 John", "رسالَةُ يُوحَنّا الثّانيَة";
    ThirdJohn = 64, "3JN", 1, "3John", "3 John", "رسالَةُ يُوحَنّا الثّالثَة";
    Jude = 65, "JUD", 1, "Jude", "Jude", "يَهُوذا";
    Revelation = 66, "REV", 22, "Rev", "Revelation", "رُؤيا يُوحَنّا";
}

/// Extra spellings seen in commentary sources that are not an id, OSIS code or common name.
const NAME_ALIASES: &[(&str, BookId)] = &[
    ("Psalm", BookId::Psalms),
    ("Song of Solomon", BookId::SongOfSongs),
    ("Canticles", BookId::SongOfSongs),
    ("Revelations", BookId::Revelation),
];

lazy_static! {
    /// Normalized name -> book. Ids win over names, names over OSIS codes.
    static ref BOOKS_BY_NAME: HashMap<String, BookId> = {
        let mut map = HashMap::new();
        for book in BookId::ALL {
            map.entry(normalize_book_name(book.as_str())).or_insert(book);
        }
        for book in BookId::ALL {
            map.entry(normalize_book_name(book.english_name())).or_insert(book);
        }
        for book in BookId::ALL {
            map.entry(normalize_book_name(book.osis())).or_insert(book);
        }
        for (alias, book) in NAME_ALIASES {
            map.entry(normalize_book_name(alias)).or_insert(*book);
        }
        map
    };
}

/// Lowercase and drop whitespace and dots: "1 Cor." -> "1cor"
fn normalize_book_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && *c != '.')
        .flat_map(char::to_lowercase)
        .collect()
}

impl BookId {
    /// Position in the canonical order, 1 to 66.
    pub fn order(&self) -> u32 {
        *self as u32
    }

    /// The nth book (1-based) in canonical order.
    pub fn from_number(number: u32) -> Option<BookId> {
        if number == 0 {
            return None;
        }
        BookId::ALL.get(number as usize - 1).copied()
    }

    /// Resolve a book from its id, English name or abbreviation, ignoring case, spaces and dots.
    pub fn from_name(name: &str) -> Option<BookId> {
        let key = normalize_book_name(name);
        if key.is_empty() {
            return None;
        }
        BOOKS_BY_NAME.get(&key).copied()
    }

    /// The localized common name used for display and for common-name links.
    pub fn common_name(&self, language: &str) -> Option<&'static str> {
        match language {
            "en" | "en-US" | "eng" => Some(self.english_name()),
            "arb" => Some(self.arabic_name()),
            _ => None,
        }
    }
}

/// Whether `common_name` knows the given language code.
pub fn is_known_language(language: &str) -> bool {
    BookId::Genesis.common_name(language).is_some()
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookId {
    type Err = ParseError;

    /// Parses a 3-character id, case insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        BookId::ALL
            .iter()
            .find(|b| b.as_str() == upper)
            .copied()
            .ok_or_else(|| ParseError::InvalidBook(s.to_string()))
    }
}

impl Serialize for BookId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for BookId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
