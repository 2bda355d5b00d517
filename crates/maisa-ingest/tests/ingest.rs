//! Tests for document discovery and XML access across an export folder.

use std::fs;
use std::path::Path;

use maisa_ingest::{
    DEFAULT_SUMMARY_FILE, HL7_V3_NS, IngestError, discover_documents, read_document,
};
use tempfile::TempDir;

const SUMMARY: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<ClinicalDocument xmlns="urn:hl7-org:v3" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <recordTarget>
    <patientRole>
      <patient>
        <name use="L"><given>Matti</given><family>Meikäläinen</family></name>
        <birthTime value="19900101"/>
      </patient>
    </patientRole>
  </recordTarget>
  <component>
    <structuredBody>
      <component>
        <section>
          <code code="10160-0"/>
          <text><content ID="med1">Burana 400 mg</content></text>
          <entry>
            <substanceAdministration>
              <consumable><manufacturedProduct><manufacturedMaterial>
                <code code="123"><originalText><reference value="#med1"/></originalText></code>
              </manufacturedMaterial></manufacturedProduct></consumable>
            </substanceAdministration>
          </entry>
        </section>
      </component>
    </structuredBody>
  </component>
</ClinicalDocument>"##;

fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).expect("write document");
}

#[test]
fn discovers_and_reads_an_export() {
    let dir = TempDir::new().expect("temp dir");
    write(dir.path(), "DOC0001.XML", SUMMARY);
    write(dir.path(), "DOC0002.XML", "<ClinicalDocument xmlns=\"urn:hl7-org:v3\"/>");
    write(dir.path(), "METADATA.XML", "<metadata/>");

    let set = discover_documents(dir.path(), DEFAULT_SUMMARY_FILE).expect("discover");
    assert_eq!(set.narratives.len(), 2);
    let summary_path = set.summary.expect("summary present");

    let summary = read_document(&summary_path).expect("read summary");
    let xml = &summary.xml;
    assert_eq!(xml.root().namespace(), Some(HL7_V3_NS));
    assert_eq!(xml.root().local_name(), "ClinicalDocument");

    let name = xml
        .select_first(r#"//v3:recordTarget/v3:patientRole/v3:patient/v3:name[@use="L"]"#)
        .expect("valid path")
        .expect("legal name");
    let given: Vec<String> = name
        .select("v3:given")
        .expect("valid path")
        .iter()
        .map(|e| e.collapsed_text())
        .collect();
    assert_eq!(given, ["Matti"]);

    let reference = xml
        .select_first("//v3:manufacturedMaterial/v3:code/v3:originalText/v3:reference")
        .expect("valid path")
        .and_then(|e| e.attr("value"))
        .expect("reference value");
    assert_eq!(xml.resolve_reference(reference).as_deref(), Some("Burana 400 mg"));
}

#[test]
fn summary_lookup_falls_back_to_case_insensitive_name() {
    let dir = TempDir::new().expect("temp dir");
    write(dir.path(), "doc0001.xml", SUMMARY);

    let set = discover_documents(dir.path(), DEFAULT_SUMMARY_FILE).expect("discover");
    let summary = set.summary.expect("summary present");
    assert_eq!(summary.file_name().and_then(|n| n.to_str()), Some("doc0001.xml"));
}

#[test]
fn malformed_document_reports_its_file_name() {
    let dir = TempDir::new().expect("temp dir");
    write(dir.path(), "DOC0003.XML", "<ClinicalDocument><title>broken</ClinicalDocument>");

    let err = read_document(&dir.path().join("DOC0003.XML")).unwrap_err();
    assert!(matches!(err, IngestError::MalformedXml { .. }));
    assert_eq!(err.file_name().as_deref(), Some("DOC0003.XML"));
    assert!(err.to_string().starts_with("DOC0003.XML: malformed XML"));
}

#[test]
fn missing_directory_is_reported() {
    let dir = TempDir::new().expect("temp dir");
    let err = discover_documents(&dir.path().join("absent"), DEFAULT_SUMMARY_FILE).unwrap_err();
    assert!(matches!(err, IngestError::DirectoryNotFound { .. }));
}
