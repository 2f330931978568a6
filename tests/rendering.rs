use std::collections::BTreeMap;
use std::path::PathBuf;

use lopdf::{dictionary, Document, Object, Stream};
use membership_form::acroform;
use membership_form::assets::{load_image, Assets, LOGO_KEY};
use membership_form::content::ContentStore;
use membership_form::fonts::{self, FontSet};
use membership_form::form::MembershipForm;
use membership_form::geometry::PageGeometry;
use membership_form::{DocumentBuilder, FormConfig, FormError};
use sha2::{Digest, Sha256};

const SKIP_REASON: &str =
    "OpenSans fonts missing. Set MEMBERSHIP_FORM_FONTS_DIR or copy them to assets/fonts.";

fn asset_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets").join(name)
}

fn render_form() -> Option<Vec<u8>> {
    if !fonts::default_fonts_available() {
        return None;
    }

    let geometry = PageGeometry::a4_form();
    let content = ContentStore::from_path(asset_path("data.json")).expect("load content");
    let form = MembershipForm::compose(&content, &geometry).expect("compose form");
    let mut assets = Assets::new(FontSet::load(None).expect("load fonts"));
    assets.insert_image(LOGO_KEY, load_image(asset_path("logo.png")).expect("load logo"));

    let rendered = DocumentBuilder::new(geometry)
        .render(form.into_items(), &assets)
        .expect("render form");
    Some(rendered.bytes)
}

/// Hashes the rendered form without the trailer ID, the info timestamps and the XMP packet,
/// which differ between runs.
fn stable_digest(bytes: &[u8]) -> [u8; 32] {
    let mut document = Document::load_mem(bytes).expect("parse rendered form");
    document.trailer.remove(b"ID");

    if let Ok(info) = document.trailer.get(b"Info").and_then(Object::as_reference) {
        if let Ok(info) = document.get_object_mut(info).and_then(Object::as_dict_mut) {
            info.remove(b"CreationDate");
            info.remove(b"ModDate");
        }
    }

    let root = document
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .expect("catalog reference");
    let catalog = document
        .get_object_mut(root)
        .and_then(Object::as_dict_mut)
        .expect("catalog");
    if let Some(Object::Reference(metadata)) = catalog.remove(b"Metadata") {
        document.objects.remove(&metadata);
    }

    let mut normalized = Vec::new();
    document
        .save_to(&mut normalized)
        .expect("save normalized form");
    Sha256::digest(&normalized).into()
}

fn stamped_pdf(title: &str, stamp: &str) -> Vec<u8> {
    let mut document = Document::with_version("1.3");
    let pages = document.add_object(dictionary! {
        "Type" => "Pages",
        "Count" => Object::Integer(0),
        "Kids" => Vec::<Object>::new(),
    });
    let metadata = document.add_object(Stream::new(
        dictionary! { "Type" => "Metadata", "Subtype" => "XML" },
        format!("<xmp:CreateDate>{stamp}</xmp:CreateDate>").into_bytes(),
    ));
    let catalog = document.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages,
        "Metadata" => metadata,
    });
    let info = document.add_object(dictionary! {
        "Title" => Object::string_literal(title),
        "CreationDate" => Object::string_literal(stamp),
        "ModDate" => Object::string_literal(stamp),
    });
    document.trailer.set("Root", catalog);
    document.trailer.set("Info", info);
    document.trailer.set(
        "ID",
        vec![Object::string_literal(stamp), Object::string_literal(stamp)],
    );

    let mut bytes = Vec::new();
    document.save_to(&mut bytes).expect("save stamped pdf");
    bytes
}

#[test]
fn digest_ignores_run_specific_metadata() {
    let first = stable_digest(&stamped_pdf("Aufnahmeantrag", "D:20240101120000"));
    let second = stable_digest(&stamped_pdf("Aufnahmeantrag", "D:20250615083000"));
    assert_eq!(first, second);

    let retitled = stable_digest(&stamped_pdf("Kündigung", "D:20240101120000"));
    assert_ne!(first, retitled);
}

#[test]
fn renders_a_readable_document() {
    let Some(bytes) = render_form() else {
        eprintln!("Skipping renders_a_readable_document: {SKIP_REASON}");
        return;
    };
    assert!(bytes.starts_with(b"%PDF"), "output should be a PDF");
    let document = Document::load_mem(&bytes).expect("parse rendered form");
    assert!(!document.get_pages().is_empty());
    let root = document
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .expect("catalog reference");
    assert!(
        document.get_dictionary(root).expect("catalog").has(b"AcroForm"),
        "the form fields should be registered with the catalog"
    );
}

#[test]
fn rendering_is_deterministic() {
    let Some(bytes_a) = render_form() else {
        eprintln!("Skipping rendering_is_deterministic: {SKIP_REASON}");
        return;
    };
    let Some(bytes_b) = render_form() else {
        eprintln!("Skipping rendering_is_deterministic: {SKIP_REASON}");
        return;
    };

    assert_eq!(bytes_a.len(), bytes_b.len(), "PDF sizes should match");

    let hash_a = stable_digest(&bytes_a);
    let hash_b = stable_digest(&bytes_b);

    assert_eq!(
        hash_a, hash_b,
        "PDF renders must be deterministic after metadata normalization"
    );
}

#[test]
fn every_field_is_fillable() {
    let Some(bytes) = render_form() else {
        eprintln!("Skipping every_field_is_fillable: {SKIP_REASON}");
        return;
    };

    let values: BTreeMap<String, String> = acroform::field_values(&bytes).expect("read fields");
    for name in [
        "Name",
        "Erziehungsberechtigte",
        "Strasse",
        "Ort",
        "Geburtsdatum",
        "Telefon",
        "EMail",
        "Name der Bank:",
        "Kontoinhaber",
        "IBAN",
        "Datum/Unterschrift des Kontoinhabers",
        "Ort/Datum",
        "Unterschrift",
    ] {
        assert_eq!(values.get(name).map(String::as_str), Some(""), "text field {name}");
    }
    for group in ["mitgliedschaft", "Abteilung", "Geschlecht", "Status", "Zahlung"] {
        assert_eq!(values.get(group).map(String::as_str), Some("Off"), "radio group {group}");
    }
    assert_eq!(values.len(), 18);

    assert_eq!(
        acroform::radio_options(&bytes, "Abteilung").expect("options"),
        [
            "Badminton",
            "Ultimate-Frisbee",
            "Frauengymnastik",
            "Kinderturnen",
            "Volleyball"
        ]
    );

    let filled = acroform::select_radio(&bytes, "Status", "u18").expect("select");
    assert_eq!(
        acroform::selected_members(&filled, "Status").expect("members"),
        ["u18"]
    );
}

#[test]
fn generate_writes_the_output_file() {
    if !fonts::default_fonts_available() {
        eprintln!("Skipping generate_writes_the_output_file: {SKIP_REASON}");
        return;
    }

    let dir = tempfile::tempdir().expect("temp dir");
    let output = dir.path().join("tsv.pdf");
    let config = FormConfig::new()
        .with_content_path(asset_path("data.json"))
        .with_logo_path(asset_path("logo.png"))
        .with_output_path(&output);

    let report = membership_form::generate(&config).expect("generate");
    assert_eq!(report.output, output);
    assert_eq!(report.fields, 18);
    assert!(report.pages >= 1);
    assert_eq!(std::fs::metadata(&output).expect("output").len() as usize, report.bytes);
}

#[test]
fn missing_logo_leaves_no_output() {
    let dir = tempfile::tempdir().expect("temp dir");
    let output = dir.path().join("tsv.pdf");
    let config = FormConfig::new()
        .with_content_path(asset_path("data.json"))
        .with_fonts_dir(dir.path().join("no-fonts"))
        .with_logo_path(dir.path().join("missing.png"))
        .with_output_path(&output);

    let err = membership_form::generate(&config).unwrap_err();
    assert!(matches!(err, FormError::AssetLoad { .. }), "got {err:?}");
    assert!(!output.exists());
}
