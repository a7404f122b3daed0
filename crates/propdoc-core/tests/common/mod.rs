//! Fixtures shared by the pipeline tests.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::sync::Arc;

use image::DynamicImage;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

use propdoc_core::error::OcrError;
use propdoc_core::models::config::PdfConfig;
use propdoc_core::{Ingestor, MockReasoning, OcrBackend, OcrEngines, StructuredExtractor, TextExtractor};

/// OCR engine that reads the same text from every image.
pub struct ScriptedOcr(pub &'static str);

impl OcrBackend for ScriptedOcr {
    fn name(&self) -> &str {
        "scripted"
    }

    fn recognize(&self, _image: &DynamicImage) -> Result<String, OcrError> {
        Ok(self.0.to_string())
    }
}

pub async fn ingestor(mock: &MockReasoning, ocr: OcrEngines) -> Ingestor {
    Ingestor::new(
        TextExtractor::new(Arc::new(ocr), PdfConfig::default()),
        StructuredExtractor::new(Arc::new(mock.clone())),
        propdoc_core::store::memory().await.unwrap(),
    )
}

/// A PDF page either drawing text or showing a gray image.
pub enum Page<'a> {
    Text(&'a str),
    Scan,
}

pub fn pdf(pages: &[Page<'_>]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    let mut kids: Vec<Object> = Vec::new();
    for page in pages {
        let (operations, resources) = match page {
            Page::Text(text) => (
                vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 11.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
                dictionary! { "Font" => dictionary! { "F1" => font_id } },
            ),
            Page::Scan => {
                let image_id = doc.add_object(Stream::new(
                    dictionary! {
                        "Type" => "XObject",
                        "Subtype" => "Image",
                        "Width" => 8,
                        "Height" => 8,
                        "ColorSpace" => "DeviceGray",
                        "BitsPerComponent" => 8,
                    },
                    vec![180u8; 64],
                ));
                (
                    vec![
                        Operation::new("q", vec![]),
                        Operation::new("Do", vec!["Im1".into()]),
                        Operation::new("Q", vec![]),
                    ],
                    dictionary! { "XObject" => dictionary! { "Im1" => image_id } },
                )
            }
        };

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

pub fn docx(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t xml:space=\"preserve\">{p}</w:t></w:r></w:p>"))
        .collect();
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    );

    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
        zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap();
    }
    buf
}

pub const LEASE_REPLY: &str = r#"```json
{
  "Lease Type": "Residential",
  "Description": "Twelve month apartment lease",
  "Property Information": {
    "Address": "12 Elm Street, Springfield",
    "Num Bedrooms": "2",
    "Num Bathrooms": 1,
    "Num Floors": null,
    "Is Commercial": false,
    "Property Type": "apartment"
  },
  "Rent Amount": {"Total": "$14,400.00", "Monthly Installment": "$1,200.00"},
  "Security Deposit": {"Amount": "$1,200.00", "Held By": "Oak Properties"},
  "Start Date": "01/01/2024",
  "End Date": "2024-12-31",
  "Tenant Information": {
    "First Name": "Jane",
    "Last Name": "Doe",
    "Landlord": "Oak Properties",
    "Address": "Not Found",
    "Email": "jane@example.com",
    "Phone Number": "555-0100",
    "Date of Birth": "Not Found",
    "Status": "current"
  },
  "Payment Frequency": "Monthly",
  "Special Lease Terms": {"Late Payment": {"Initial Fee": "$50.00", "Daily Late Charge": "$10.00"}}
}
```"#;

pub const INVOICE_REPLY: &str = r#"{
  "Invoice Number": "INV-2024-031",
  "Amount": "$1,500.00",
  "Paid Amount": "500.25",
  "Invoice Date": "03/15/2024",
  "Due Date": "2024-04-15",
  "Status": "Unpaid",
  "Vendor Information": {"Name": "Acme Plumbing", "Address": "9 Pipe Rd"},
  "Description": "Water heater replacement",
  "Line Items": [
    {"Description": "Water heater", "Quantity": "1", "Unit Price": "$1,200.00", "Total Price": "$1,200.00"},
    {"Description": "Labor", "Quantity": "3", "Unit Price": "$100.00", "Total Price": "$300.00"}
  ]
}"#;

pub const CONTRACT_REPLY: &str = r#"{
  "Contract Type": "Service Agreement",
  "Description": "Quarterly HVAC maintenance",
  "Start Date": "01/01/2024",
  "End Date": "Not Found",
  "Parties Involved": {"Name": "Cool Air LLC", "Role": "Provider"},
  "Vendor Information": {"Name": "Cool Air LLC", "Email": "Not Found"},
  "Terms": {"Payment Terms": "$300 per visit"},
  "Is Active": "True"
}"#;
