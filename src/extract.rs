//! Extraction gate: native text layer vs OCR.
//!
//! The native text layer is trusted only when it holds more than `min_words`
//! words. OCR always runs; aggressive page cleanup is applied only when the
//! native layer was judged insufficient.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info, warn};
use unicode_normalization::UnicodeNormalization;
use whatlang::Lang;

use crate::config::CorrectorConfig;
use crate::error::{CorrectionError, CorrectionResult};

/// Names of the OCR artifacts written into the working directory.
const OCR_OUTPUT: &str = "tmp.pdf";
const OCR_SIDECAR: &str = "tmp.txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSource {
    Native,
    Ocr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionResult {
    pub text: String,
    pub source: TextSource,
    /// Reliably detected language of the text, if any
    pub language: Option<Lang>,
}

impl ExtractionResult {
    fn new(text: String, source: TextSource) -> Self {
        let language = detect_language(&text);
        Self {
            text,
            source,
            language,
        }
    }
}

/// Both text sources of one document.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub ocr: ExtractionResult,
    /// Present only when the native layer was judged reliable
    pub native: Option<ExtractionResult>,
}

impl Extraction {
    /// OCR first, then native.
    pub fn sources(&self) -> impl Iterator<Item = &ExtractionResult> {
        std::iter::once(&self.ocr).chain(self.native.as_ref())
    }
}

/// Outcome of inspecting the native text layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeAssessment {
    pub reliable: bool,
    pub text: Option<String>,
}

/// Everything the OCR engine is asked to do for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub sidecar: PathBuf,
    pub languages: Vec<String>,
    pub deskew: bool,
    pub rotate_pages: bool,
    pub remove_background: bool,
    pub clean: bool,
    pub unpaper_args: Option<String>,
    pub redo_ocr: bool,
    pub force_ocr: bool,
}

impl OcrRequest {
    /// Build the request; cleanup and forced OCR follow `native_reliable` inverted.
    pub fn for_document(
        input: &Path,
        workdir: &Path,
        languages: Vec<String>,
        unpaper_args: Option<String>,
        native_reliable: bool,
    ) -> Self {
        let force = !native_reliable;
        Self {
            input: input.to_path_buf(),
            output: workdir.join(OCR_OUTPUT),
            sidecar: workdir.join(OCR_SIDECAR),
            languages,
            deskew: force,
            rotate_pages: force,
            remove_background: force,
            clean: force,
            unpaper_args,
            redo_ocr: !force,
            force_ocr: force,
        }
    }
}

/// Converts a document's page images into a text sidecar.
pub trait OcrEngine: Send + Sync {
    /// Must write `request.sidecar` on success.
    fn run(&self, request: &OcrRequest) -> CorrectionResult<()>;
}

/// Pulls the embedded text layer out of a document, one string per page.
pub trait TextLayerExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> CorrectionResult<Vec<String>>;
}

/// Words in `text` once commas, apostrophes and periods are dropped.
pub fn count_words(text: &str) -> usize {
    text.replace([',', '\'', '.'], "")
        .to_lowercase()
        .split_whitespace()
        .count()
}

pub fn detect_language(text: &str) -> Option<Lang> {
    whatlang::detect(text)
        .filter(|info| info.is_reliable())
        .map(|info| info.lang())
}

/// Tesseract traineddata code for a detected language.
pub fn tesseract_code(lang: Lang) -> Option<&'static str> {
    let code = match lang {
        Lang::Eng => "eng",
        Lang::Deu => "deu",
        Lang::Fra => "fra",
        Lang::Spa => "spa",
        Lang::Ita => "ita",
        Lang::Por => "por",
        Lang::Nld => "nld",
        Lang::Rus => "rus",
        Lang::Pol => "pol",
        Lang::Swe => "swe",
        Lang::Dan => "dan",
        Lang::Fin => "fin",
        _ => return None,
    };
    Some(code)
}

pub struct ExtractionGate {
    ocr: Box<dyn OcrEngine>,
    extractor: Box<dyn TextLayerExtractor>,
    min_words: usize,
    languages: Vec<String>,
    unpaper_args: Option<String>,
    auto_language: bool,
}

impl ExtractionGate {
    pub fn new(
        ocr: Box<dyn OcrEngine>,
        extractor: Box<dyn TextLayerExtractor>,
        config: &CorrectorConfig,
    ) -> Self {
        Self {
            ocr,
            extractor,
            min_words: config.min_words,
            languages: config.ocr_languages.clone(),
            unpaper_args: config.unpaper_args.clone(),
            auto_language: config.auto_ocr_language,
        }
    }

    /// Decide whether the native text layer is usable.
    pub fn assess_native(&self, input: &Path) -> CorrectionResult<NativeAssessment> {
        let text = self.extractor.extract(input)?.join(" ");
        let words = count_words(&text);
        let reliable = words > self.min_words;
        info!(
            path = %input.display(),
            words,
            min_words = self.min_words,
            reliable,
            "Assessed native text layer"
        );
        Ok(NativeAssessment {
            reliable,
            text: reliable.then_some(text),
        })
    }

    /// Extract both text sources; OCR always runs, native only if reliable.
    ///
    /// OCR artifacts are written into `workdir` and removed afterwards.
    pub fn extract(&self, input: &Path, workdir: &Path) -> CorrectionResult<Extraction> {
        let assessment = self.assess_native(input)?;
        let native = assessment
            .text
            .map(|text| ExtractionResult::new(text, TextSource::Native));

        let mut languages = self.languages.clone();
        if self.auto_language {
            let code = native
                .as_ref()
                .and_then(|n| n.language)
                .and_then(tesseract_code);
            if let Some(code) = code {
                if !languages.iter().any(|l| l == code) {
                    debug!(code, "Adding detected language to OCR");
                    languages.push(code.to_string());
                }
            }
        }

        let request = OcrRequest::for_document(
            input,
            workdir,
            languages,
            self.unpaper_args.clone(),
            assessment.reliable,
        );
        info!(
            force_ocr = request.force_ocr,
            languages = %request.languages.join("+"),
            "Running OCR"
        );
        let sidecar = self
            .ocr
            .run(&request)
            .and_then(|()| {
                fs::read_to_string(&request.sidecar).map_err(|e| {
                    CorrectionError::extraction(
                        input,
                        format!("Failed to read OCR sidecar {}: {}", request.sidecar.display(), e),
                    )
                })
            });
        remove_artifacts(&request);
        let ocr_text: String = sidecar?.nfc().collect();

        Ok(Extraction {
            ocr: ExtractionResult::new(ocr_text, TextSource::Ocr),
            native,
        })
    }
}

fn remove_artifacts(request: &OcrRequest) {
    for path in [&request.output, &request.sidecar] {
        match fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove OCR artifact"),
        }
    }
}

/// Runs the `ocrmypdf` executable.
#[derive(Debug, Clone)]
pub struct OcrMyPdf {
    program: PathBuf,
}

impl Default for OcrMyPdf {
    fn default() -> Self {
        Self::new("ocrmypdf")
    }
}

impl OcrMyPdf {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn arguments(&self, request: &OcrRequest) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--language".into(),
            request.languages.join("+").into(),
            "--sidecar".into(),
            request.sidecar.clone().into(),
        ];
        let flags = [
            (request.deskew, "--deskew"),
            (request.rotate_pages, "--rotate-pages"),
            (request.remove_background, "--remove-background"),
            (request.clean, "--clean"),
            (request.redo_ocr, "--redo-ocr"),
            (request.force_ocr, "--force-ocr"),
        ];
        args.extend(flags.iter().filter(|(on, _)| *on).map(|(_, flag)| OsString::from(flag)));
        if let Some(unpaper) = &request.unpaper_args {
            args.push("--unpaper-args".into());
            args.push(unpaper.into());
        }
        args.push(request.input.clone().into());
        args.push(request.output.clone().into());
        args
    }
}

impl OcrEngine for OcrMyPdf {
    fn run(&self, request: &OcrRequest) -> CorrectionResult<()> {
        let output = Command::new(&self.program)
            .args(self.arguments(request))
            .output()
            .map_err(|e| {
                CorrectionError::extraction(
                    &request.input,
                    format!("Failed to run {}: {}", self.program.display(), e),
                )
            })?;
        if !output.status.success() {
            return Err(CorrectionError::extraction(
                &request.input,
                format!(
                    "{} exited with {}: {}",
                    self.program.display(),
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }
        Ok(())
    }
}

/// Runs Poppler's `pdftotext`, splitting pages on form feeds.
#[derive(Debug, Clone)]
pub struct PdfToText {
    program: PathBuf,
}

impl Default for PdfToText {
    fn default() -> Self {
        Self {
            program: PathBuf::from("pdftotext"),
        }
    }
}

impl PdfToText {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

/// Split pdftotext output into pages; the trailing form feed opens no page.
fn split_pages(raw: &str) -> Vec<String> {
    let mut pages: Vec<String> = raw.split('\u{c}').map(str::to_string).collect();
    if pages.last().is_some_and(|p| p.trim().is_empty()) {
        pages.pop();
    }
    pages
}

impl TextLayerExtractor for PdfToText {
    fn extract(&self, path: &Path) -> CorrectionResult<Vec<String>> {
        let output = Command::new(&self.program)
            .arg("-enc")
            .arg("UTF-8")
            .arg(path)
            .arg("-")
            .output()
            .map_err(|e| {
                CorrectionError::extraction(path, format!("Failed to run {}: {}", self.program.display(), e))
            })?;
        if !output.status.success() {
            return Err(CorrectionError::extraction(
                path,
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(split_pages(&String::from_utf8_lossy(&output.stdout)))
    }
}
