//! End-to-end fill pipeline tests
//!
//! Exercises the full path a submission takes: raw labeled data in,
//! normalized keys, resolved values, rendered document out. Fixture PDFs
//! are built with lopdf and the output is reloaded and inspected.

use std::io::Cursor;

use lopdf::{dictionary, Document, Object, ObjectId};
use pdffill_core::{normalize_form_data, render};
use signfast_types::{
    form_data_from_json, FieldKind, FormData, FormFieldDef, RawTemplateField, Template,
    TemplateField,
};

/// A two-page Letter document.
fn create_fixture_pdf(num_pages: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let kids: Vec<Object> = (0..num_pages)
        .map(|_| {
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => Object::Reference(pages_id),
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            });
            Object::Reference(page_id)
        })
        .collect();

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => num_pages as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

fn field(kind: &str, variable: &str, page: u32) -> TemplateField {
    let mut f = TemplateField::from_raw(RawTemplateField::default());
    f.kind = FieldKind::from_str_lenient(Some(kind));
    f.variable = format!("${{{}}}", variable);
    f.page = page;
    f.x_ratio = 0.1;
    f.y_ratio = 0.2;
    f.width_ratio = 0.4;
    f.height_ratio = 0.05;
    f
}

fn png_data_url() -> String {
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;

    let img = image::RgbaImage::from_pixel(40, 20, image::Rgba([0, 0, 128, 255]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    format!("data:image/png;base64,{}", BASE64.encode(&bytes))
}

fn all_pages_content(bytes: &[u8]) -> String {
    let doc = Document::load_mem(bytes).unwrap();
    let pages: Vec<ObjectId> = doc.get_pages().values().copied().collect();
    let mut out = String::new();
    for page_id in pages {
        out.push_str(&String::from_utf8_lossy(
            &doc.get_page_content(page_id).unwrap_or_default(),
        ));
    }
    out
}

#[test]
fn fills_every_field_kind_in_one_pass() {
    let json = serde_json::json!({
        "Nom du Client": "Dupont",
        "Montant": 1250,
        "Date de Signature": "2024-03-05",
        "Accepte les conditions": true,
        "Signature Client": png_data_url(),
    });
    let raw = form_data_from_json(json.as_object().unwrap());
    let declared = vec![
        FormFieldDef { label: "Nom du Client".into(), kind: FieldKind::Text },
        FormFieldDef { label: "Montant".into(), kind: FieldKind::Number },
        FormFieldDef { label: "Date de Signature".into(), kind: FieldKind::Date },
        FormFieldDef { label: "Accepte les conditions".into(), kind: FieldKind::Checkbox },
        FormFieldDef { label: "Signature Client".into(), kind: FieldKind::Signature },
    ];
    let normalized = normalize_form_data(&raw, &declared);
    assert!(normalized.conflicts.is_empty());

    let template = Template::new(
        vec![
            field("text", "nom_du_client", 1),
            field("number", "montant", 1),
            field("date", "date_de_signature", 1),
            field("checkbox", "accepte_les_conditions", 2),
            field("signature", "signature_client", 2),
        ],
        create_fixture_pdf(2),
        2,
    );

    let bytes = render(&template, &normalized.normalized).unwrap();
    assert!(bytes.starts_with(b"%PDF-"));

    let reloaded = Document::load_mem(&bytes).unwrap();
    assert_eq!(reloaded.get_pages().len(), 2);

    let content = all_pages_content(&bytes);
    assert!(content.contains("(Dupont) Tj"));
    assert!(content.contains("(1250) Tj"));
    assert!(content.contains("(05/03/2024) Tj"));
    // checkbox square + checkmark
    assert!(content.contains("re S"));
    // embedded signature image
    assert!(content.contains("Do"));
    assert!(!content.contains("Signature manquante"));
}

#[test]
fn accented_labels_reach_template_variables() {
    // The form says "Téléphone Mobile"; the template author wrote
    // ${telephone_mobile}. Normalization bridges the two.
    let json = serde_json::json!({ "Téléphone Mobile": "0601020304" });
    let raw = form_data_from_json(json.as_object().unwrap());
    let normalized = normalize_form_data(&raw, &[]);

    let template = Template::new(
        vec![field("text", "telephone_mobile", 1)],
        create_fixture_pdf(1),
        1,
    );
    let content = all_pages_content(&render(&template, &normalized.normalized).unwrap());
    assert!(content.contains("(0601020304) Tj"));
}

#[test]
fn raw_unnormalized_data_still_resolves() {
    // Rendering straight from raw data (no normalization pass) relies on
    // the resolver's own normalized-key step.
    let json = serde_json::json!({ "Téléphone Mobile": "0601020304" });
    let raw = form_data_from_json(json.as_object().unwrap());

    let template = Template::new(
        vec![field("text", "telephone_mobile", 1)],
        create_fixture_pdf(1),
        1,
    );
    let content = all_pages_content(&render(&template, &raw).unwrap());
    assert!(content.contains("(0601020304) Tj"));
}

#[test]
fn missing_page_field_is_skipped_and_document_stays_valid() {
    let mut orphan = field("text", "nom", 1);
    orphan.page = 99;
    let template = Template::new(vec![orphan], create_fixture_pdf(1), 1);

    let mut data = FormData::new();
    data.insert(
        "nom".to_string(),
        signfast_types::FormValue::Text("Dupont".to_string()),
    );

    let bytes = render(&template, &data).unwrap();
    let reloaded = Document::load_mem(&bytes).unwrap();
    assert_eq!(reloaded.get_pages().len(), 1);
    assert!(!all_pages_content(&bytes).contains("(Dupont)"));
}

#[test]
fn signature_fields_never_borrow_each_other() {
    let json = serde_json::json!({ "signature_agent": png_data_url() });
    let raw = form_data_from_json(json.as_object().unwrap());

    let template = Template::new(
        vec![
            field("signature", "signature_client", 1),
            field("signature", "signature_agent", 1),
        ],
        create_fixture_pdf(1),
        1,
    );
    let content = all_pages_content(&render(&template, &raw).unwrap());
    // The client slot shows the placeholder; the agent slot embeds.
    assert!(content.contains("(Signature manquante) Tj"));
    assert!(content.contains("Do"));
}

#[test]
fn corrupt_signature_payload_degrades_to_placeholder() {
    // Valid base64, but not a decodable PNG.
    let json = serde_json::json!({ "signature_client": "data:image/png;base64,aGVsbG8=" });
    let raw = form_data_from_json(json.as_object().unwrap());

    let template = Template::new(
        vec![field("signature", "signature_client", 1)],
        create_fixture_pdf(1),
        1,
    );
    let bytes = render(&template, &raw).unwrap();
    assert!(all_pages_content(&bytes).contains("(Signature manquante) Tj"));
}

#[test]
fn raw_field_records_render_without_errors() {
    // Stored records with junk attributes still produce a document.
    let raw_fields: Vec<RawTemplateField> = serde_json::from_value(serde_json::json!([
        {"type": "text", "page": 1, "variable": "${nom}", "xRatio": "0.2", "widthRatio": null},
        {"type": "mystery", "variable": "${nom}"},
        {}
    ]))
    .unwrap();
    let fields: Vec<TemplateField> = raw_fields.into_iter().map(TemplateField::from_raw).collect();

    let template = Template::new(fields, create_fixture_pdf(1), 1);
    let mut data = FormData::new();
    data.insert(
        "nom".to_string(),
        signfast_types::FormValue::Text("Zoé".to_string()),
    );

    let bytes = render(&template, &data).unwrap();
    assert!(Document::load_mem(&bytes).is_ok());
}
