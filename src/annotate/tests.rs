use super::*;

fn tagged(text: &str, lemma: &str, pos: &str) -> AnnotatedToken {
    AnnotatedToken {
        text: text.to_string(),
        lemma: lemma.to_string(),
        pos: pos.to_string(),
        is_alpha: true,
    }
}

#[test]
fn regex_annotator_keeps_only_alphabetic_tokens() {
    let mut annotator = RegexAnnotator::new().expect("annotator");
    let annotation = annotator
        .annotate("Wawel ma 1000 lat, a zamek_2 stoi. Łódź!")
        .expect("annotates");

    assert_eq!(
        annotation.tokens(false),
        vec!["Wawel", "ma", "lat", "a", "stoi", "Łódź"]
    );
    assert_eq!(
        annotation.lemmas(true),
        vec!["wawel", "ma", "lat", "a", "stoi", "łódź"]
    );
}

#[test]
fn regex_annotator_splits_sentences_on_punctuation_and_lines() {
    let mut annotator = RegexAnnotator::new().expect("annotator");
    let annotation = annotator
        .annotate("# Zamek\n\nTo jest zamek. Czy stoi? Tak!\n---")
        .expect("annotates");

    assert_eq!(
        annotation.sentences(),
        &["# Zamek", "To jest zamek.", "Czy stoi?", "Tak!"]
    );
}

#[test]
fn regex_annotator_has_no_content_words() {
    let mut annotator = RegexAnnotator::new().expect("annotator");
    let annotation = annotator.annotate("Zamek stoi wysoko.").expect("annotates");
    assert!(annotation.content_words().is_empty());
}

#[test]
fn annotation_filters_content_words_and_counts_pos() {
    let mut punct = tagged(",", ",", "PUNCT");
    punct.is_alpha = false;
    let annotation = Annotation {
        tokens: vec![
            tagged("Stary", "stary", "ADJ"),
            tagged("Zamek", "zamek", "NOUN"),
            punct,
            tagged("i", "i", "CCONJ"),
            tagged("stoi", "stać", "VERB"),
        ],
        sentences: vec!["Stary Zamek, i stoi".to_string()],
    };

    assert_eq!(annotation.content_words(), vec!["stary", "zamek", "stoi"]);
    assert_eq!(annotation.tokens(true).len(), 4);

    let counts = annotation.pos_counts();
    assert_eq!(counts.get("NOUN"), Some(&1));
    assert_eq!(counts.get("CCONJ"), Some(&1));
    assert_eq!(counts.get("PUNCT"), None);
}

#[test]
fn command_response_accepts_annotation_or_error() {
    let ok: AnnotateResponse = serde_json::from_str(
        r#"{"tokens":[{"text":"Zamek","lemma":"zamek","pos":"NOUN","is_alpha":true}],"sentences":["Zamek."]}"#,
    )
    .expect("annotation response parses");
    assert!(ok.error.is_none());
    assert_eq!(ok.annotation.tokens.len(), 1);

    let failed: AnnotateResponse =
        serde_json::from_str(r#"{"error":"model missing"}"#).expect("error response parses");
    assert_eq!(failed.error.as_deref(), Some("model missing"));
    assert!(failed.annotation.tokens.is_empty());
}

#[test]
fn closures_act_as_annotator_factories() {
    let factory = || -> Result<Box<dyn Annotator>> { Ok(Box::new(RegexAnnotator::new()?)) };
    let mut annotator = factory.create().expect("factory creates annotator");
    assert_eq!(
        annotator.annotate("a b").expect("annotates").tokens(true),
        vec!["a", "b"]
    );
}

#[test]
fn command_annotator_reports_missing_program() {
    let factory = CommandAnnotatorFactory::new("article-metrics-no-such-annotator", Vec::new());
    let err = factory.create().err().expect("spawn fails");
    assert!(format!("{err:#}").contains("failed to execute annotator"));
}

#[cfg(unix)]
#[test]
fn command_annotator_speaks_one_json_line_per_text() {
    // `cat` echoes the request, which parses as an annotation without tokens.
    let mut annotator = CommandAnnotator::spawn("cat", &[]).expect("cat starts");
    for text in ["Zamek stoi.", "Rynek"] {
        let annotation = annotator.annotate(text).expect("response parses");
        assert!(annotation.tokens.is_empty());
        assert!(annotation.sentences().is_empty());
    }
}
