use scripture_backend::book_order::BookId;
use scripture_backend::error::ParseError;
use scripture_backend::logger::{MemoryLogger, NoopLogger};
use scripture_backend::parser::usx_parser::UsxParser;
use scripture_backend::types::{
    Caller, Chapter, ChapterContent, Footnote, FootnoteVerseRef, FormattedText, Heading, HebrewSubtitle, ParseTree,
    RootContent, Verse, VerseContent,
};

fn text(s: &str) -> VerseContent {
    VerseContent::Text(s.to_string())
}

fn poem(s: &str, level: u32) -> VerseContent {
    VerseContent::Formatted(FormattedText { text: s.to_string(), poem: Some(level), ..FormattedText::default() })
}

fn heading(s: &str) -> Heading {
    Heading { content: vec![s.to_string()] }
}

fn verse(number: u32, content: Vec<VerseContent>) -> ChapterContent {
    ChapterContent::Verse(Verse { number, content })
}

fn only_chapter(tree: &ParseTree) -> &Chapter {
    let chapters: Vec<&Chapter> = tree.chapters().collect();
    assert_eq!(chapters.len(), 1);
    chapters[0]
}

#[test]
fn test_simple_book() {
    let usx = r#"
        <usx version="3.0">
            <book code="GEN" style="id">- Berean Study Bible</book>
            <para style="h">Genesis</para>
            <para style="toc2">Genesis</para>
            <para style="toc1">Genesis</para>
            <para style="mt1">Genesis</para>
            <chapter number="1" style="c" sid="GEN 1"/>
            <para style="s1">The Creation</para>
            <para style="r">(John 1:1–5; Hebrews 11:1–3)</para>
            <para style="m">
                <verse number="1" style="v" sid="GEN 1:1"/>
                <char style="w" strong="H7225">In</char>
                <char style="w" strong="H7225">the</char>
                <char style="w" strong="H7225">beginning</char>
                <char style="w" strong="H0430">God</char>
                <char style="w" strong="H1254">created</char>
                <char style="w" strong="H8064">the</char>
                <char style="w" strong="H8064">heavens</char>
                <char style="w" strong="H0853">and</char>
                <char style="w" strong="H0776">the</char>
                <char style="w" strong="H0776">earth</char>.
                <verse eid="GEN 1:1"/>
            </para>
            <para style="b"/>
            <para style="m">
                <verse number="2" style="v" sid="GEN 1:2"/>
                <char style="w" strong="H0776">Now</char>
                <char style="w" strong="H0776">the</char>
                <char style="w" strong="H0776">earth</char>
                <char style="w" strong="H1961">was</char>
                <char style="w" strong="H8414">formless</char>
                <char style="w" strong="H0922">and</char>
                <char style="w" strong="H0922">void</char>.
                <verse eid="GEN 1:2"/>
            </para>
            <chapter eid="GEN 1"/>
        </usx>
    "#;

    let tree = UsxParser::parse(usx, &NoopLogger).unwrap();
    assert_eq!(tree.id, Some(BookId::Genesis));
    assert_eq!(tree.header.as_deref(), Some("Genesis"));
    assert_eq!(tree.title.as_deref(), Some("Genesis"));
    assert!(tree.parse_messages.is_empty());

    let chapter = only_chapter(&tree);
    assert_eq!(chapter.number, 1);
    assert_eq!(
        chapter.content,
        vec![
            ChapterContent::Heading(heading("The Creation")),
            verse(1, vec![text("In the beginning God created the heavens and the earth.")]),
            ChapterContent::LineBreak,
            verse(2, vec![text("Now the earth was formless and void.")]),
        ]
    );
    assert!(chapter.footnotes.is_empty());
}

#[test]
fn test_major_titles_in_document_order() {
    let usx = r#"
        <usx version="3.0">
            <book code="GEN" style="id"/>
            <para style="mt2">The Title</para>
            <para style="mt1">of the</para>
            <para style="mt3">Book</para>
        </usx>
    "#;
    let tree = UsxParser::parse(usx, &NoopLogger).unwrap();
    assert_eq!(tree.title.as_deref(), Some("The Title of the Book"));
    assert_eq!(tree.header, None);
    assert!(tree.content.is_empty());
}

#[test]
fn test_headings_and_multiple_chapters() {
    let usx = r#"
        <usx version="3.0">
            <book code="GEN" style="id"/>
            <chapter number="1" style="c" sid="GEN 1"/>
            <para style="p"><verse number="1" style="v" sid="GEN 1:1"/>In the beginning.<verse eid="GEN 1:1"/></para>
            <chapter eid="GEN 1"/>
            <para style="s1">Between chapters</para>
            <chapter number="2" style="c" sid="GEN 2"/>
            <para style="s2">The Seventh Day</para>
            <para style="p"><verse number="1" style="v" sid="GEN 2:1"/>Thus the heavens.<verse eid="GEN 2:1"/></para>
            <chapter eid="GEN 2"/>
        </usx>
    "#;
    let tree = UsxParser::parse(usx, &NoopLogger).unwrap();

    assert_eq!(tree.content.len(), 3);
    assert!(matches!(&tree.content[0], RootContent::Chapter(c) if c.number == 1 && c.verse_count() == 1));
    assert_eq!(tree.content[1], RootContent::Heading(heading("Between chapters")));
    let RootContent::Chapter(second) = &tree.content[2] else {
        panic!("expected a chapter");
    };
    assert_eq!(
        second.content,
        vec![
            ChapterContent::Heading(heading("The Seventh Day")),
            verse(1, vec![text("Thus the heavens.")]),
        ]
    );
}

#[test]
fn test_chapter_without_end_marker() {
    let usx = r#"
        <usx version="2.0">
            <book code="GEN" style="id"/>
            <chapter number="1" style="c"/>
            <para style="p"><verse number="1" style="v"/>First.</para>
            <chapter number="2" style="c"/>
            <para style="p"><verse number="1" style="v"/>Second.</para>
        </usx>
    "#;
    let tree = UsxParser::parse(usx, &NoopLogger).unwrap();
    let chapters: Vec<&Chapter> = tree.chapters().collect();
    assert_eq!(chapters.len(), 2);
    assert_eq!(chapters[0].content, vec![verse(1, vec![text("First.")])]);
    assert_eq!(chapters[1].number, 2);
    assert_eq!(chapters[1].content, vec![verse(1, vec![text("Second.")])]);
}

#[test]
fn test_footnotes() {
    let usx = r#"
        <usx version="3.0">
            <book code="GEN" style="id"/>
            <chapter number="2" style="c" sid="GEN 2"/>
            <para style="m">
                <verse number="1" style="v" sid="GEN 2:1"/>Thus the heavens and the earth were completed.
                <verse eid="GEN 2:1"/>
                <verse number="2" style="v" sid="GEN 2:2"/>
                <char style="w">He</char> <char style="w">rested</char>.
                <note style="f" caller="+">
                    <char style="fr"/>
                    <char style="ft">2:2 </char>
                    <char style="ft">Cited in Hebrews 4:4</char>
                </note>
                <verse eid="GEN 2:2"/>
            </para>
        </usx>
    "#;
    let tree = UsxParser::parse(usx, &NoopLogger).unwrap();
    let chapter = only_chapter(&tree);

    assert_eq!(
        chapter.content,
        vec![
            verse(1, vec![text("Thus the heavens and the earth were completed.")]),
            verse(2, vec![text("He rested."), VerseContent::footnote(1)]),
        ]
    );
    assert_eq!(
        chapter.footnotes,
        vec![Footnote {
            note_id: 1,
            text: "Cited in Hebrews 4:4".to_string(),
            caller: Caller::Generated,
            reference: Some(FootnoteVerseRef { chapter: 2, verse: 2 }),
        }]
    );
}

#[test]
fn test_several_footnotes_in_one_verse() {
    let usx = r#"
        <usx>
            <book code="ZEC" style="id"/>
            <chapter number="12" style="c" sid="ZEC 12"/>
            <para style="b"/>
            <para style="m"><verse number="10" style="v" sid="ZEC 12:10"/><char style="w">a</char> <char style="w">spirit</char> <note style="f" caller="+"><char style="fr"/><char style="ft">12:10 </char><char style="ft">Or the Spirit</char></note> <char style="w">of</char> <char style="w">grace</char>,<note style="f" caller="a"><char style="ft">Or to Me</char></note> <char style="w">the</char> <char style="w">One</char>.<verse eid="ZEC 12:10"/> <verse number="11" style="v" sid="ZEC 12:11"/><char style="w">On</char> <char style="w">that</char> <char style="w">day</char>.<verse eid="ZEC 12:11"/></para>
            <chapter eid="ZEC 12"/>
        </usx>
    "#;
    let tree = UsxParser::parse(usx, &NoopLogger).unwrap();
    assert_eq!(tree.id, Some(BookId::Zechariah));
    let chapter = only_chapter(&tree);

    assert_eq!(
        chapter.content,
        vec![
            ChapterContent::LineBreak,
            verse(
                10,
                vec![
                    text("a spirit"),
                    VerseContent::footnote(1),
                    text("of grace,"),
                    VerseContent::footnote(2),
                    text("the One."),
                ]
            ),
            verse(11, vec![text("On that day.")]),
        ]
    );
    let notes: Vec<(u32, &str, &Caller)> =
        chapter.footnotes.iter().map(|f| (f.note_id, f.text.as_str(), &f.caller)).collect();
    assert_eq!(
        notes,
        vec![
            (1, "Or the Spirit", &Caller::Generated),
            (2, "Or to Me", &Caller::Explicit("a".to_string())),
        ]
    );
}

#[test]
fn test_descriptive_title_with_footnote() {
    let usx = r#"
        <usx version="3.0">
            <book code="PSA" style="id"/>
            <chapter number="6" style="c" sid="PSA 6"/>
            <para style="s1">Do Not Rebuke Me in Your Anger</para>
            <para style="r">(Psalms 38:1–22)</para>
            <para style="d">
                For the choirmaster. With stringed instruments, according to Sheminith.
                <note style="f" caller="+">
                <char style="fr"/>
                <char style="ft">6:0 </char>
                <char style="ft">Sheminith is probably a musical term.</char>
                </note>
                A Psalm of David.
            </para>
            <para style="b"/>
            <para style="q1">
                <verse number="1" style="v" sid="PSA 6:1"/>
                <char style="w">O</char>
                <char style="w">LORD</char>,
                <char style="w">do</char>
                <char style="w">not</char>
                <char style="w">rebuke</char>
                <char style="w">me</char>
            </para>
            <para style="q2">
                <char style="w">or</char>
                <char style="w">discipline</char>
                <char style="w">me</char>.
                <verse eid="PSA 6:1"/>
            </para>
        </usx>
    "#;
    let tree = UsxParser::parse(usx, &NoopLogger).unwrap();
    let chapter = only_chapter(&tree);

    assert_eq!(
        chapter.content,
        vec![
            ChapterContent::Heading(heading("Do Not Rebuke Me in Your Anger")),
            ChapterContent::HebrewSubtitle(HebrewSubtitle {
                content: vec![
                    text("For the choirmaster. With stringed instruments, according to Sheminith."),
                    VerseContent::footnote(1),
                    text("A Psalm of David."),
                ],
            }),
            ChapterContent::LineBreak,
            verse(1, vec![poem("O LORD, do not rebuke me", 1), poem("or discipline me.", 2)]),
        ]
    );
    assert_eq!(chapter.footnotes.len(), 1);
    assert_eq!(chapter.footnotes[0].text, "Sheminith is probably a musical term.");
    assert_eq!(chapter.footnotes[0].reference, Some(FootnoteVerseRef { chapter: 6, verse: 0 }));
}

#[test]
fn test_verse_inside_descriptive_title() {
    let usx = r#"
        <usx version="3.0">
            <book code="ZEC" style="id"/>
            <chapter number="12" style="c" sid="ZEC 12"/>
            <para style="s1">The Coming Deliverance of Jerusalem</para>
            <para style="d"><verse number="1" style="v" sid="ZEC 12:1"/><char style="w">This</char> <char style="w">is</char> <char style="w">the</char> <char style="w">burden</char>.</para>
            <para style="b"/>
            <para style="m"><char style="w">Thus</char> <char style="w">declares</char> <char style="w">the</char> <char style="w">LORD</char>:<verse eid="ZEC 12:1"/></para>
        </usx>
    "#;
    let tree = UsxParser::parse(usx, &NoopLogger).unwrap();
    let chapter = only_chapter(&tree);

    assert_eq!(
        chapter.content,
        vec![
            ChapterContent::Heading(heading("The Coming Deliverance of Jerusalem")),
            verse(
                1,
                vec![
                    VerseContent::Formatted(FormattedText {
                        text: "This is the burden.".to_string(),
                        descriptive: true,
                        ..FormattedText::default()
                    }),
                    VerseContent::line_break(),
                    text("Thus declares the LORD:"),
                ]
            ),
        ]
    );
}

#[test]
fn test_cross_references_are_ignored() {
    let usx = r#"
        <usx version="3.0">
            <book code="MAT" style="id"/>
            <chapter number="2" style="c" sid="MAT 2"/>
            <para style="p"><verse number="15" style="v" sid="MAT 2:15"/>Out of Egypt I called My Son.<note style="x" caller="-"><char style="xo">2:15 </char><char style="xt">Hosea 11:1</char></note><verse eid="MAT 2:15"/></para>
        </usx>
    "#;
    let tree = UsxParser::parse(usx, &NoopLogger).unwrap();
    let chapter = only_chapter(&tree);
    assert_eq!(chapter.content, vec![verse(15, vec![text("Out of Egypt I called My Son.")])]);
    assert!(chapter.footnotes.is_empty());
}

#[test]
fn test_words_of_jesus_in_poetry() {
    let usx = r#"
        <usx version="3.0">
            <book code="MAT" style="id"/>
            <chapter number="5" style="c" sid="MAT 5"/>
            <para style="q1">
                <verse number="3" style="v" sid="MAT 5:3"/>
                <char style="wj">
                    &#8220;<char style="w">Blessed</char>
                    <char style="w">are</char>
                    <char style="w">the</char>
                    <char style="w">poor</char>
                    <char style="w">in</char>
                    <char style="w">spirit</char>,
                </char>
            </para>
            <para style="q2">
                <char style="wj">
                    <char style="w">for</char>
                    <char style="w">theirs</char>
                    <char style="w">is</char>
                    <char style="w">the</char>
                    <char style="w">Kingdom</char>
                    <char style="w">of</char>
                    <char style="w">Heaven</char>.
                </char>
                <note style="x" caller="+">
                    <char style="xo">5:3 </char>
                    <char style="xt">Isaiah 57:15; 66:2</char>
                </note>
                <verse eid="MAT 5:3"/>
            </para>
        </usx>
    "#;
    let tree = UsxParser::parse(usx, &NoopLogger).unwrap();
    let chapter = only_chapter(&tree);

    let wj = |s: &str, level: u32| {
        VerseContent::Formatted(FormattedText {
            text: s.to_string(),
            poem: Some(level),
            words_of_jesus: true,
            ..FormattedText::default()
        })
    };
    assert_eq!(
        chapter.content,
        vec![verse(
            3,
            vec![wj("\u{201c}Blessed are the poor in spirit,", 1), wj("for theirs is the Kingdom of Heaven.", 2)]
        )]
    );
}

#[test]
fn test_words_of_jesus_across_verses() {
    let usx = r#"
        <usx version="3.0">
            <book code="MAT" style="id"/>
            <chapter number="17" style="c" sid="MAT 17"/>
            <para style="p"><verse number="26" style="v" sid="MAT 17:26"/><char style="w">Peter</char> <char style="w">said</char>, &#8220;<char style="w">From</char> <char style="w">strangers</char>.&#8221;</para>
            <para style="p"><char style="w">Jesus</char> <char style="w">said</char>, <char style="wj">&#8220;<char style="w">Then</char> <char style="w">the</char> <char style="w">children</char> <char style="w">are</char> <char style="w">exempt</char>. </char><verse eid="MAT 17:26"/> <verse number="27" style="v" sid="MAT 17:27"/><char style="wj"><char style="w">But</char> <char style="w">go</char>.</char><note style="f" caller="+"><char style="fr">17:27 </char><char style="ft">A stater is a silver coin.</char></note> <char style="wj"><char style="w">Take</char> <char style="w">that</char>.&#8221;</char><verse eid="MAT 17:27"/></para>
            <chapter eid="MAT 17"/>
        </usx>
    "#;
    let tree = UsxParser::parse(usx, &NoopLogger).unwrap();
    let chapter = only_chapter(&tree);

    let wj = |s: &str| {
        VerseContent::Formatted(FormattedText { text: s.to_string(), words_of_jesus: true, ..FormattedText::default() })
    };
    assert_eq!(
        chapter.content,
        vec![
            verse(
                26,
                vec![
                    text("Peter said, \u{201c}From strangers.\u{201d} Jesus said,"),
                    wj("\u{201c}Then the children are exempt."),
                ]
            ),
            verse(27, vec![wj("But go."), VerseContent::footnote(1), wj("Take that.\u{201d}")]),
        ]
    );
    assert_eq!(chapter.footnotes[0].text, "A stater is a silver coin.");
    assert_eq!(chapter.footnotes[0].reference, Some(FootnoteVerseRef { chapter: 17, verse: 27 }));
}

#[test]
fn test_verse_spanning_paragraphs() {
    let usx = r#"
        <usx version="3.0">
            <book code="GEN" style="id"/>
            <chapter number="26" style="c" sid="GEN 26"/>
            <para style="m"><verse number="9" style="v" sid="GEN 26:9"/><char style="w">Abimelech</char> <char style="w">sent</char> <char style="w">for</char> <char style="w">Isaac</char>.</para>
            <para style="b"/>
            <para style="m"><char style="w">Isaac</char> <char style="w">replied</char>.<verse eid="GEN 26:9"/></para>
        </usx>
    "#;
    let tree = UsxParser::parse(usx, &NoopLogger).unwrap();
    let chapter = only_chapter(&tree);
    assert_eq!(
        chapter.content,
        vec![verse(9, vec![text("Abimelech sent for Isaac."), VerseContent::line_break(), text("Isaac replied.")])]
    );
}

#[test]
fn test_line_break_between_poem_lines_of_same_indent() {
    let usx = r#"
        <usx version="3.0">
            <book code="MAT" style="id"/>
            <chapter number="2" style="c" sid="MAT 2"/>
            <para style="q2"><verse number="18" style="v" sid="MAT 2:18"/><char style="w">she</char> wouldn&#8217;t <char style="w">be</char> <char style="w">comforted</char>,</para>
            <para style="q2"><char style="w">because</char> <char style="w">they</char> <char style="w">are</char> <char style="w">no</char> <char style="w">more</char>.&#8221;<verse eid="MAT 2:18"/></para>
        </usx>
    "#;
    let tree = UsxParser::parse(usx, &NoopLogger).unwrap();
    let chapter = only_chapter(&tree);
    assert_eq!(
        chapter.content,
        vec![verse(
            18,
            vec![
                poem("she wouldn\u{2019}t be comforted,", 2),
                VerseContent::line_break(),
                poem("because they are no more.\u{201d}", 2),
            ]
        )]
    );
}

#[test]
fn test_poem_verse_without_end_marker() {
    let usx = r#"
        <usx version="3.0">
            <book code="MAT" style="id"/>
            <chapter number="1" style="c" sid="MAT 1"/>
            <para style="q1"><verse number="23" style="v" sid="MAT 1:23"/>&#8220;<char style="w">Behold</char>, <char style="w">the</char> <char style="w">virgin</char>,</para>
            <para style="q2"><char style="w">and</char> <char style="w">a</char> <char style="w">son</char>.</para>
        </usx>
    "#;
    let tree = UsxParser::parse(usx, &NoopLogger).unwrap();
    let chapter = only_chapter(&tree);
    assert_eq!(
        chapter.content,
        vec![verse(23, vec![poem("\u{201c}Behold, the virgin,", 1), poem("and a son.", 2)])]
    );
}

#[test]
fn test_missing_verses_are_reported() {
    let usx = r#"
        <usx version="3.0">
            <book code="MAT" style="id"/>
            <chapter number="17" style="c" sid="MAT 17"/>
            <para style="p"><verse number="18" style="v" sid="MAT 17:18"/>One.<verse eid="MAT 17:18"/></para>
            <para style="p"><verse number="20" style="v" sid="MAT 17:20"/>Two.<verse eid="MAT 17:20"/></para>
            <para style="p"><verse number="22" style="v" sid="MAT 17:22"/>Three.<verse eid="MAT 17:22"/></para>
            <chapter eid="MAT 17"/>
            <chapter number="18" style="c" sid="MAT 18"/>
            <para style="p"><verse number="1" style="v" sid="MAT 18:1"/>Four.<verse eid="MAT 18:1"/></para>
        </usx>
    "#;
    let log = MemoryLogger::new();
    let tree = UsxParser::parse(usx, &log).unwrap();

    // 17:21 is left out by most translations.
    let messages: Vec<&str> = tree.parse_messages.iter().map(|m| m.message.as_str()).collect();
    assert_eq!(messages, vec!["Verse MAT 17:19 is missing."]);
    assert_eq!(log.warnings(), vec!["Verse MAT 17:19 is missing.".to_string()]);
}

#[test]
fn test_unknown_book_code() {
    let usx = r#"<usx><book code="XYZ"/><chapter number="1" style="c"/><para style="p"><verse number="1" style="v"/>Text</para></usx>"#;
    let tree = UsxParser::parse(usx, &NoopLogger).unwrap();
    assert_eq!(tree.id, None);
    assert_eq!(tree.parse_messages[0].message, "Unknown book code: XYZ");
    assert_eq!(tree.chapters().count(), 1);
}

#[test]
fn test_missing_book_element() {
    let err = UsxParser::parse(r#"<usx version="3.0"><para style="h">Genesis</para></usx>"#, &NoopLogger).unwrap_err();
    assert!(matches!(err, ParseError::MissingElement(name) if name == "book"));

    let err = UsxParser::parse(r#"<usx><book code=""/></usx>"#, &NoopLogger).unwrap_err();
    assert!(matches!(err, ParseError::InvalidBook(_)));
}
