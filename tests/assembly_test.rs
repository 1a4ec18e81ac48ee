//! Integration tests for package assembly.

use std::io::{Cursor, Write};
use unofd::xml::{find_all_by_tag, find_attribute, find_first_by_tag};
use unofd::{parse_bytes, parse_bytes_with_options, parse_file, parse_reader, Error, ParseOptions};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const MANIFEST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ofd:OFD xmlns:ofd="http://www.ofdspec.org/2016" Version="1.1" DocType="OFD">
    <ofd:DocBody>
        <ofd:DocInfo>
            <ofd:DocID>6f1d2a</ofd:DocID>
            <ofd:Title>Invoice</ofd:Title>
            <ofd:Author>Accounts</ofd:Author>
        </ofd:DocInfo>
        <ofd:DocRoot>Doc_0/Document.xml</ofd:DocRoot>
    </ofd:DocBody>
</ofd:OFD>"#;

const RESOURCES: &str = r#"<ofd:Res xmlns:ofd="http://www.ofdspec.org/2016" BaseLoc="Res">
    <ofd:MultiMedias>
        <ofd:MultiMedia ID="12" Type="Image" Format="PNG"><ofd:MediaFile>logo.png</ofd:MediaFile></ofd:MultiMedia>
    </ofd:MultiMedias>
</ofd:Res>"#;

const LOGO: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3, 4];

fn document_xml(page_count: usize) -> String {
    let pages: String = (0..page_count)
        .map(|i| format!(r#"<ofd:Page ID="{}" BaseLoc="Pages/Page_{i}/Content.xml"/>"#, i + 1))
        .collect();
    format!(
        r#"<ofd:Document xmlns:ofd="http://www.ofdspec.org/2016">
    <ofd:CommonData>
        <ofd:MaxUnitID>40</ofd:MaxUnitID>
        <ofd:PageArea><ofd:PhysicalBox>0 0 210 140</ofd:PhysicalBox></ofd:PageArea>
        <ofd:DocumentRes>DocumentRes.xml</ofd:DocumentRes>
    </ofd:CommonData>
    <ofd:Pages>{pages}</ofd:Pages>
</ofd:Document>"#
    )
}

fn page_xml(index: usize) -> String {
    format!(
        r#"<ofd:Page xmlns:ofd="http://www.ofdspec.org/2016">
    <ofd:Content>
        <ofd:Layer ID="{layer}">
            <ofd:TextObject ID="{text}" Boundary="10 10 80 6" Font="3">
                <ofd:TextCode X="0" Y="5">Page {index}</ofd:TextCode>
            </ofd:TextObject>
            <ofd:ImageObject ID="{image}" ResourceID="12" Boundary="150 10 40 20"/>
        </ofd:Layer>
    </ofd:Content>
</ofd:Page>"#,
        layer = 100 + index * 3,
        text = 101 + index * 3,
        image = 102 + index * 3,
    )
}

fn package(files: &[(String, Vec<u8>)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in files {
        zip.start_file(name.as_str(), SimpleFileOptions::default())
            .unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

fn ofd(page_count: usize) -> Vec<u8> {
    let mut files = vec![
        ("OFD.xml".to_string(), MANIFEST.as_bytes().to_vec()),
        ("Doc_0/Document.xml".to_string(), document_xml(page_count).into_bytes()),
        ("Doc_0/DocumentRes.xml".to_string(), RESOURCES.as_bytes().to_vec()),
        ("Doc_0/Res/logo.png".to_string(), LOGO.to_vec()),
    ];
    for i in 0..page_count {
        files.push((
            format!("Doc_0/Pages/Page_{i}/Content.xml"),
            page_xml(i).into_bytes(),
        ));
    }
    package(&files)
}

#[test]
fn test_missing_manifest_is_fatal() {
    let data = package(&[(
        "Doc_0/Document.xml".to_string(),
        document_xml(1).into_bytes(),
    )]);

    let err = parse_bytes(&data).unwrap_err();
    assert!(matches!(err, Error::MissingRequiredPart(ref part) if part == "OFD.xml"));
    assert!(err.is_fatal());
}

#[test]
fn test_document_without_signatures() {
    let document = parse_bytes(&ofd(2)).unwrap();

    assert!(document.signature_list.is_none());
    assert!(document.signatures.is_empty());
    assert_eq!(document.page_count(), 2);
    assert_eq!(document.pages[0].id, "1");
    assert_eq!(document.pages[1].part, "Doc_0/Pages/Page_1/Content.xml");
    assert_eq!(document.pages[1].text_codes(), vec!["Page 1"]);
    assert_eq!(document.metadata.title.as_deref(), Some("Invoice"));
    assert_eq!(document.metadata.format_version.as_deref(), Some("1.1"));
}

#[test]
fn test_manifest_and_root_only() {
    let root = r#"<ofd:Document xmlns:ofd="http://www.ofdspec.org/2016"><ofd:CommonData/></ofd:Document>"#;
    let data = package(&[
        ("OFD.xml".to_string(), MANIFEST.as_bytes().to_vec()),
        ("Doc_0/Document.xml".to_string(), root.as_bytes().to_vec()),
    ]);

    let document = parse_bytes(&data).unwrap();
    assert!(document.pages.is_empty());
    assert!(document.document_root.is_some());
}

#[test]
fn test_page_arity_invariance() {
    for count in [1, 2, 5] {
        let document = parse_bytes(&ofd(count)).unwrap();
        assert_eq!(document.page_count(), count);

        // One declared page and many declared pages query the same way
        let pages = find_first_by_tag(document.document_root.as_ref(), "ofd:Pages");
        assert_eq!(find_all_by_tag(pages, "ofd:Page").len(), count);
        for (i, page) in document.pages.iter().enumerate() {
            assert_eq!(page.index, i);
            assert_eq!(page.text_objects().len(), 1);
            assert_eq!(page.image_objects().len(), 1);
        }
    }
}

#[test]
fn test_parallel_and_sequential_agree() {
    let data = ofd(8);
    let parallel = parse_bytes(&data).unwrap();
    let sequential =
        parse_bytes_with_options(&data, ParseOptions::default().sequential()).unwrap();

    assert_eq!(parallel.page_count(), sequential.page_count());
    for (a, b) in parallel.pages.iter().zip(&sequential.pages) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.node, b.node);
    }
}

#[test]
fn test_attribute_prefix_is_transparent() {
    let document = parse_bytes(&ofd(1)).unwrap();
    let page = document.page(0).unwrap();
    let image = page.image_objects()[0];

    assert_eq!(image.attribute("ResourceID"), Some("12"));
    assert_eq!(image.attribute("@_ResourceID"), Some("12"));
    assert_eq!(
        find_attribute(page.node.as_ref(), "Boundary"),
        find_attribute(page.node.as_ref(), "@_Boundary")
    );
    // Repeated queries give the same answer
    assert_eq!(
        find_attribute(page.node.as_ref(), "Boundary"),
        find_attribute(page.node.as_ref(), "Boundary")
    );
}

#[test]
fn test_media_is_loaded_once() {
    let document = parse_bytes(&ofd(1)).unwrap();

    assert_eq!(document.media_path("12").as_deref(), Some("Doc_0/Res/logo.png"));
    let first = document.load_media("12").unwrap();
    assert_eq!(&first[..], LOGO);

    let clone = document.clone();
    let second = clone.load_media("12").unwrap();
    assert_eq!(first, second);
    assert!(document.load_media("99").is_none());
}

#[test]
fn test_page_box_defaults_to_page_area() {
    let document = parse_bytes(&ofd(1)).unwrap();
    let page_box = document.page_box(0).unwrap();
    assert_eq!((page_box.width, page_box.height), (210.0, 140.0));
}

#[test]
fn test_parse_file_and_reader() {
    let data = ofd(3);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sample.ofd");
    std::fs::write(&path, &data).unwrap();

    let from_file = parse_file(&path).unwrap();
    let from_reader = parse_reader(Cursor::new(data)).unwrap();
    assert_eq!(from_file.page_count(), 3);
    assert_eq!(from_reader.page_count(), 3);
}

#[test]
fn test_not_an_archive() {
    let err = parse_bytes(b"plain text, not a package").unwrap_err();
    assert!(matches!(err, Error::Archive(_)));
}
