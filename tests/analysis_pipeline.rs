use image_insight::core_modules::color_clusterer::{calculate_saturation, find_dominant_colors, rng_for};
use image_insight::core_modules::compression_estimator::CompressionEstimator;
use image_insight::core_modules::image_stats::format_file_size;
use image_insight::core_modules::luminance_analyzer::LuminanceAnalyzer;
use image_insight::core_modules::performance_projector::{PerformanceProjector, ResolutionAssessment};
use image_insight::parallel_pipeline::AnalysisSession;
use image_insight::{
    AnalysisConfig, AnalysisKind, AnalysisOutcome, AnalysisPipeline, Color, ImageMetadata, Pixel,
    PixelBuffer,
};

fn metadata(size_bytes: u64, mime_type: &str) -> ImageMetadata {
    ImageMetadata {
        size_bytes,
        mime_type: mime_type.to_string(),
        last_modified: Some(1_700_000_000_000),
    }
}

fn seeded_config() -> AnalysisConfig {
    AnalysisConfig {
        kmeans_seed: Some(2024),
        worker_pool_size: 2,
        ..AnalysisConfig::default()
    }
}

/// A 64x48 image with a horizontal gradient and a colored square.
fn synthetic_photo() -> PixelBuffer {
    let (width, height) = (64u32, 48u32);
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            let base = (x * 4) as u8;
            if (16..32).contains(&x) && (16..32).contains(&y) {
                data.extend_from_slice(&[220, 40, 40, 255]);
            } else {
                data.extend_from_slice(&[base, base, base.saturating_add(10), 255]);
            }
        }
    }
    PixelBuffer::new(width, height, data).unwrap()
}

#[test]
fn all_white_scenario() {
    let buffer = PixelBuffer::filled(2, 2, Pixel::new(255, 255, 255, 255)).unwrap();
    let analysis = LuminanceAnalyzer::new(&buffer).get_analysis();

    let top_bin = analysis.histogram.iter().find(|point| point.value == 255).unwrap();
    assert_eq!(top_bin.count, 100.0);
    assert_eq!(analysis.brightness_distribution.mean_brightness, 255.0);
    let very_bright = analysis
        .brightness_distribution
        .distribution
        .iter()
        .find(|band| band.range == "Very Bright")
        .unwrap();
    assert_eq!(very_bright.percentage, 100.0);
    assert_eq!(analysis.clipping_analysis.shadow_clipping, 0.0);
    assert_eq!(analysis.clipping_analysis.highlight_clipping, 100.0);
}

#[test]
fn checkerboard_scenario() {
    let data: Vec<u8> = [0, 0, 0, 255, 255, 255, 255, 255, 255, 255, 255, 255, 0, 0, 0, 255].to_vec();
    let buffer = PixelBuffer::new(2, 2, data).unwrap();
    let pipeline = AnalysisPipeline::new(seeded_config()).unwrap();

    assert_eq!(calculate_saturation(&buffer), 0.0);
    match pipeline
        .run(AnalysisKind::Structure, &buffer, &metadata(64, "image/png"))
        .unwrap()
    {
        AnalysisOutcome::Structure(structure) => {
            assert!(structure.noise_level > 100.0);
            assert_eq!(structure.noise_level, structure.texture_complexity);
        }
        other => panic!("expected structure, got {:?}", other.kind()),
    }
}

#[test]
fn single_cluster_is_the_mean_color() {
    let buffer = synthetic_photo();
    let colors = find_dominant_colors(&buffer, 1, 20, &mut rng_for(Some(5))).unwrap();

    let count = buffer.pixel_count() as f64;
    let mean = |channel: fn(&Pixel) -> u8| {
        (buffer.pixels().map(|p| channel(&p) as f64).sum::<f64>() / count).round() as u8
    };
    let expected = Color::new(mean(|p| p.red), mean(|p| p.green), mean(|p| p.blue));
    assert_eq!(colors, vec![expected]);
}

#[test]
fn pooled_entropy_of_flat_images() {
    let buffer = PixelBuffer::filled(10, 10, Pixel::new(12, 34, 56, 255)).unwrap();
    let estimator = CompressionEstimator::new(&buffer, 150, 24).unwrap();
    // Three channel values, each a third of the pooled histogram.
    assert!((estimator.calculate_image_entropy() - 3f64.log2()).abs() < 1e-9);

    let gray = PixelBuffer::filled(10, 10, Pixel::new(90, 90, 90, 255)).unwrap();
    let estimator = CompressionEstimator::new(&gray, 150, 24).unwrap();
    assert_eq!(estimator.analyze_lossless_potential().entropy, 0.0);
}

#[test]
fn file_size_and_resolution_banding() {
    assert_eq!(format_file_size(1_234_567), "1.18 MB");

    let half = PerformanceProjector::new(1000, 1000, 512 * 1024, "image/jpeg").unwrap();
    assert_eq!(
        half.calculate_resolution_ratio().assessment,
        ResolutionAssessment::Average
    );
}

#[test]
fn full_report_is_consistent_and_serializable() {
    let buffer = synthetic_photo();
    let pipeline = AnalysisPipeline::new(seeded_config()).unwrap();
    let report = pipeline
        .analyze_all(&buffer, &metadata(4_000, "image/webp"))
        .unwrap();

    let pixels = buffer.pixel_count() as u64;
    assert_eq!(report.color.histograms.red.total(), pixels);
    assert_eq!(report.color.dominant_colors.len(), 5);
    assert!(
        report.luminance.dynamic_range_analysis.effective_range
            <= report.luminance.dynamic_range_analysis.range
    );
    assert_eq!(report.statistics.aspect_ratio.to_string(), "4:3");
    assert_eq!(report.compression.format_potential.len(), 5);

    let json = serde_json::to_value(&report).unwrap();
    assert!(json["luminance"]["brightnessDistribution"]["meanBrightness"].is_number());
    assert!(json["compression"]["currentCompression"]["bitsPerPixel"].is_number());
    assert_eq!(json["performance"]["browserCompatibility"]["format"], "WEBP");
}

#[tokio::test]
async fn session_delivers_every_kind_for_the_current_image() {
    let session = AnalysisSession::new(seeded_config()).unwrap();
    let tag = session
        .select_image(synthetic_photo(), metadata(4_000, "image/jpeg"))
        .await;

    let outcomes = session.analyze(tag, &AnalysisKind::ALL).await;
    let kinds: Vec<AnalysisKind> = outcomes
        .into_iter()
        .map(|outcome| outcome.unwrap().kind())
        .collect();
    assert_eq!(kinds, AnalysisKind::ALL.to_vec());
    session.shutdown().await;
}
