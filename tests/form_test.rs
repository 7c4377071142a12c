//! Form and file naming tests
//!
//! Tests that submit validation and output file names behave the way
//! the window relies on

use habla::form::{Form, ValidationError};
use habla::submission::{Speed, Submission};
use std::collections::HashSet;
use std::path::PathBuf;

#[test]
fn test_submit_requires_text() {
    let mut form = Form::new();
    form.set_directory(Some(PathBuf::from("/tmp")));

    assert_eq!(form.submit(), Err(ValidationError::EmptyText));
}

#[test]
fn test_submit_requires_directory() {
    let mut form = Form::new();
    form.text = "Hola mundo".to_string();

    assert_eq!(form.submit(), Err(ValidationError::NoDirectory));

    // Cancelling the chooser doesn't count as a selection
    form.set_directory(None);
    assert_eq!(form.submit(), Err(ValidationError::NoDirectory));
}

#[test]
fn test_submit_snapshots_form() {
    let mut form = Form::new();
    form.text = "Hola mundo".to_string();
    form.speed = Speed::from_tenths(15).unwrap();
    form.set_directory(Some(PathBuf::from("/srv/audio")));

    let submission = form.submit().expect("form is complete");

    // Later edits don't reach the submission already taken
    form.text.clear();
    form.set_directory(Some(PathBuf::from("/elsewhere")));

    assert_eq!(submission.text, "Hola mundo");
    assert_eq!(submission.output_directory, PathBuf::from("/srv/audio"));
    assert_eq!(submission.output_file_name(), "Hola_speed_1.5.wav");
}

#[test]
fn test_whitespace_only_text_is_accepted() {
    // Only emptiness is checked, not content
    let mut form = Form::new();
    form.text = " ".to_string();
    form.set_directory(Some(PathBuf::from("/tmp")));

    let submission = form.submit().unwrap();
    assert_eq!(submission.output_file_name(), "_speed_1.0.wav");
}

#[test]
fn test_hola_mundo_file_name() {
    let submission = Submission::new("Hola mundo", "/tmp", Speed::DEFAULT);
    assert_eq!(submission.output_file_name(), "Hola_speed_1.0.wav");
}

#[test]
fn test_every_speed_gives_distinct_name() {
    let names: Vec<String> = Speed::all()
        .iter()
        .map(|&speed| Submission::new("Hola mundo", "/tmp", speed).output_file_name())
        .collect();

    assert_eq!(names.len(), 17);
    assert_eq!(names.iter().collect::<HashSet<_>>().len(), names.len());
    assert_eq!(names[0], "Hola_speed_0.4.wav");
    assert_eq!(names[6], "Hola_speed_1.0.wav");
    assert_eq!(names[16], "Hola_speed_2.0.wav");

    for (name, speed) in names.iter().zip(Speed::all()) {
        let expected = format!("Hola_speed_{:.1}.wav", speed.multiplier());
        assert_eq!(name, &expected);
    }
}

#[test]
fn test_default_speed_is_in_selector() {
    assert!(Speed::all().contains(&Speed::DEFAULT));
    assert_eq!(Form::new().speed.to_string(), "1.0");
}
