// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline construction — merge the config file with command-line overrides and
// wire the classifier and both extractors into a router.
//
// The OCR engine is optional at runtime: when its models cannot be loaded (or
// the binary was built without the `ocr` feature) scanned documents still get
// routed, and each one reports the reason as a failed OCR result.

use std::path::PathBuf;

use pagesense_core::config::{PipelineConfig, QualityConfig};
use pagesense_core::error::Result;
use pagesense_document::analysis::Classifier;
use pagesense_document::extract::{
    ExtractionRouter, Extractor, TextLayerExtractor, UnavailableExtractor,
};
use tracing::info;

/// Name the OCR extractor reports, also used by its unavailable stand-in.
const OCR_EXTRACTOR: &str = "OCRExtractor";

/// Command-line values that override the loaded configuration.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config_file: Option<PathBuf>,
    pub dpi: Option<u32>,
    pub margin: Option<u32>,
    pub gap_ratio: Option<f64>,
    pub script: Option<String>,
}

/// Defaults, then the config file, then command-line overrides. The merged
/// result is validated.
pub fn resolve_config(overrides: &Overrides) -> Result<PipelineConfig> {
    let mut config = match &overrides.config_file {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };

    if let Some(dpi) = overrides.dpi {
        config.ocr.dpi = dpi;
    }
    if let Some(margin) = overrides.margin {
        config.ocr.margin = margin;
    }
    if let Some(gap_ratio) = overrides.gap_ratio {
        config.ordering.gap_ratio = gap_ratio;
    }
    if let Some(script) = &overrides.script {
        config.quality = QualityConfig::preset(script)?;
    }

    config.validate()?;
    Ok(config)
}

/// Router over the text-layer extractor and the best OCR extractor available.
/// `pdfium_dir` is where the pdfium shared library is looked up before the
/// system paths.
pub fn build_router(
    config: &PipelineConfig,
    model_dir: Option<PathBuf>,
    pdfium_dir: Option<PathBuf>,
) -> ExtractionRouter {
    ExtractionRouter::new(
        Classifier::from_config(config),
        Box::new(TextLayerExtractor),
        ocr_extractor(config, model_dir, pdfium_dir),
    )
}

#[cfg(feature = "ocr")]
fn ocr_extractor(
    config: &PipelineConfig,
    model_dir: Option<PathBuf>,
    pdfium_dir: Option<PathBuf>,
) -> Box<dyn Extractor> {
    use pagesense_document::extract::OcrExtractor;
    use pagesense_document::pdf::PdfiumRasterizer;
    use pagesense_document::scan::{OcrConfig, OcrEngine};

    let ocr_config = model_dir.map(OcrConfig::from_dir).unwrap_or_default();
    match OcrEngine::new(ocr_config) {
        Ok(engine) => {
            info!(dpi = config.ocr.dpi, "OCR engine loaded");
            let extractor = OcrExtractor::with_config(engine, config);
            match PdfiumRasterizer::bind(pdfium_dir.as_deref()) {
                Ok(rasterizer) => Box::new(extractor.with_rasterizer(rasterizer)),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "pdfium unavailable; pages with visible text cannot be rendered for OCR"
                    );
                    Box::new(extractor)
                }
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "OCR engine unavailable; scanned documents will fail");
            Box::new(UnavailableExtractor::new(OCR_EXTRACTOR, e.to_string()))
        }
    }
}

#[cfg(not(feature = "ocr"))]
fn ocr_extractor(
    _config: &PipelineConfig,
    model_dir: Option<PathBuf>,
    pdfium_dir: Option<PathBuf>,
) -> Box<dyn Extractor> {
    if model_dir.is_some() || pdfium_dir.is_some() {
        info!("--model-dir and --pdfium-dir ignored: built without the `ocr` feature");
    }
    Box::new(UnavailableExtractor::new(
        OCR_EXTRACTOR,
        "pagesense was built without the `ocr` feature",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_win_over_defaults() {
        let overrides = Overrides {
            dpi: Some(150),
            margin: Some(4),
            gap_ratio: Some(0.4),
            script: Some("latin".into()),
            ..Overrides::default()
        };
        let config = resolve_config(&overrides).unwrap();
        assert_eq!(config.ocr.dpi, 150);
        assert_eq!(config.ocr.margin, 4);
        assert_eq!(config.ordering.gap_ratio, 0.4);
        assert_eq!(config.quality, QualityConfig::latin());
    }

    #[test]
    fn overrides_win_over_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pagesense.json");
        std::fs::write(&path, r#"{ "ocr": { "dpi": 200 }, "ordering": { "gap_ratio": 0.3 } }"#)
            .unwrap();

        let overrides = Overrides {
            config_file: Some(path),
            dpi: Some(96),
            ..Overrides::default()
        };
        let config = resolve_config(&overrides).unwrap();
        assert_eq!(config.ocr.dpi, 96);
        assert_eq!(config.ordering.gap_ratio, 0.3);
    }

    #[test]
    fn invalid_overrides_are_rejected() {
        let zero_dpi = Overrides {
            dpi: Some(0),
            ..Overrides::default()
        };
        assert_eq!(resolve_config(&zero_dpi).unwrap_err().kind(), "ConfigError");

        let unknown_script = Overrides {
            script: Some("klingon".into()),
            ..Overrides::default()
        };
        assert_eq!(resolve_config(&unknown_script).unwrap_err().kind(), "ConfigError");
    }

    #[test]
    fn router_always_has_an_ocr_path() {
        let dir = tempfile::tempdir().unwrap();
        let router = build_router(
            &PipelineConfig::default(),
            Some(dir.path().to_path_buf()),
            Some(dir.path().to_path_buf()),
        );
        let ocr = router.extractor_for(pagesense_core::types::Verdict::Scanned);
        assert_eq!(ocr.name(), OCR_EXTRACTOR);
    }
}
