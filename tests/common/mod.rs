#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Cursor, Write};

use async_trait::async_trait;
use maven_exploder::error::{Error, Result};
use maven_exploder::remote::Fetch;
use zip::CompressionMethod;
use zip::write::{FileOptions, ZipWriter};

pub const BASE_URL: &str = "http://repo.test/maven2/";

/// In-memory repository: registered paths are served, everything else is a 404.
#[derive(Default)]
pub struct FakeRepository {
    files: HashMap<String, Vec<u8>>,
}

impl FakeRepository {
    pub fn serve(mut self, path: &str, body: impl Into<Vec<u8>>) -> Self {
        self.files.insert(format!("{}{}", BASE_URL, path), body.into());
        self
    }
}

#[async_trait]
impl Fetch for FakeRepository {
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        self.files.get(url).cloned().ok_or_else(|| Error::Http {
            url: url.to_string(),
            status: 404,
            message: "Not Found".to_string(),
        })
    }
}

pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::<()>::default().compression_method(CompressionMethod::Stored);
    for (name, data) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// Smallest valid class file: `public class <name> extends java/lang/Object`
/// with no members.
pub fn empty_class(name: &str) -> Vec<u8> {
    fn utf8(out: &mut Vec<u8>, text: &str) {
        out.push(1);
        out.extend_from_slice(&(text.len() as u16).to_be_bytes());
        out.extend_from_slice(text.as_bytes());
    }

    let mut out = Vec::new();
    out.extend_from_slice(&0xCAFE_BABEu32.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&52u16.to_be_bytes());

    out.extend_from_slice(&5u16.to_be_bytes());
    utf8(&mut out, name);
    out.extend_from_slice(&[7, 0, 1]);
    utf8(&mut out, "java/lang/Object");
    out.extend_from_slice(&[7, 0, 3]);

    out.extend_from_slice(&0x0021u16.to_be_bytes());
    out.extend_from_slice(&2u16.to_be_bytes());
    out.extend_from_slice(&4u16.to_be_bytes());
    // interfaces, fields, methods, attributes
    out.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 0]);
    out
}
