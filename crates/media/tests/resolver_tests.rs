//! Cache-backed resolution against real files in temporary directories.

use std::io::Cursor;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use connect_core::{
    compile_with_provider, AudioRequest, Clue, DataUri, FileSystemProvider, ImageRequest,
    InMemoryProvider, MediaResolver, MediaSource,
};
use connect_media::{
    content_digest, AudioResolver, CacheKey, CachingResolver, ContentCache, DiskCache, ImageResolver,
    MemoryCache,
};
use image::{DynamicImage, GenericImageView, ImageFormat, RgbImage};
use tempfile::TempDir;

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, [10, 120, 200].into()));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

/// Audio tools that cannot exist, so any audio cache miss fails loudly.
fn no_audio_tools() -> AudioResolver {
    AudioResolver::new("/nonexistent/ffmpeg", "/nonexistent/yt-dlp")
}

fn disk_resolver(quiz_dir: &Path, cache_dir: &Path) -> CachingResolver<DiskCache> {
    CachingResolver::new(
        DiskCache::new(cache_dir),
        Box::new(FileSystemProvider),
        quiz_dir,
        ImageResolver::new(256, "connect-maker-tests"),
        no_audio_tools(),
    )
}

fn embedded_dimensions(uri: &DataUri) -> (u32, u32) {
    let bytes = STANDARD.decode(uri.payload()).unwrap();
    image::load_from_memory(&bytes).unwrap().dimensions()
}

fn local_image(path: &str) -> ImageRequest {
    ImageRequest {
        source: MediaSource::Local(path.to_owned()),
    }
}

#[test]
fn second_resolution_is_a_cache_hit_with_identical_bytes() {
    let tmp = TempDir::new().unwrap();
    let quiz = tmp.path().join("quiz");
    std::fs::create_dir_all(quiz.join("images")).unwrap();
    std::fs::write(quiz.join("images/cat.png"), png_bytes(640, 480)).unwrap();

    let resolver = disk_resolver(&quiz, &tmp.path().join("cache"));
    let first = resolver.resolve_image(&local_image("images/cat.png")).unwrap();
    assert_eq!(resolver.misses(), 1);

    let second = resolver.resolve_image(&local_image("images/cat.png")).unwrap();
    assert_eq!(resolver.hits(), 1);
    assert_eq!(resolver.misses(), 1);
    assert_eq!(first, second);
    assert_eq!(first.mime(), "image/png");
}

#[test]
fn disk_cache_survives_across_runs() {
    let tmp = TempDir::new().unwrap();
    let quiz = tmp.path().join("quiz");
    std::fs::create_dir_all(quiz.join("images")).unwrap();
    std::fs::write(quiz.join("images/dog.png"), png_bytes(100, 300)).unwrap();
    let cache_dir = tmp.path().join("cache");

    let first = disk_resolver(&quiz, &cache_dir)
        .resolve_image(&local_image("./images/dog.png"))
        .unwrap();

    let second_run = disk_resolver(&quiz, &cache_dir);
    let second = second_run
        .resolve_image(&local_image("images/dog.png"))
        .unwrap();
    assert_eq!(second_run.hits(), 1);
    assert_eq!(second_run.misses(), 0);
    assert_eq!(first, second);
}

#[test]
fn edited_image_is_fitted_again() {
    let tmp = TempDir::new().unwrap();
    let quiz = tmp.path().join("quiz");
    std::fs::create_dir_all(quiz.join("images")).unwrap();
    let cache_dir = tmp.path().join("cache");
    std::fs::write(quiz.join("images/cat.png"), png_bytes(512, 256)).unwrap();

    let first = disk_resolver(&quiz, &cache_dir)
        .resolve_image(&local_image("images/cat.png"))
        .unwrap();
    assert_eq!(embedded_dimensions(&first), (256, 128));

    std::fs::write(quiz.join("images/cat.png"), png_bytes(100, 400)).unwrap();
    let second_run = disk_resolver(&quiz, &cache_dir);
    let second = second_run
        .resolve_image(&local_image("images/cat.png"))
        .unwrap();
    assert_eq!(second_run.hits(), 0);
    assert_eq!(second_run.misses(), 1);
    assert_eq!(embedded_dimensions(&second), (64, 256));
}

#[test]
fn edited_audio_file_is_not_served_from_cache() {
    let tmp = TempDir::new().unwrap();
    let quiz = tmp.path().join("quiz");
    std::fs::create_dir_all(quiz.join("audio")).unwrap();
    let cache_dir = tmp.path().join("cache");
    let source = quiz.join("audio/x.mp3");
    std::fs::write(&source, b"ID3 first take").unwrap();

    let clip = connect_media::images::encode_data_uri("audio/mpeg", b"ID3 clip");
    let key = CacheKey::local_audio(
        &source.display().to_string(),
        &content_digest(b"ID3 first take"),
        0,
        40,
    );
    DiskCache::new(&cache_dir).put(&key, &clip).unwrap();

    let request = AudioRequest {
        source: MediaSource::Local("audio/x.mp3".to_owned()),
        start: 0,
        duration: 40,
    };
    let resolver = disk_resolver(&quiz, &cache_dir);
    assert_eq!(resolver.resolve_audio(&request).unwrap(), clip);

    // New contents miss the cache, and the tools do not exist.
    std::fs::write(&source, b"ID3 second take").unwrap();
    assert!(resolver.resolve_audio(&request).is_err());
    assert_eq!(resolver.hits(), 1);
}

#[test]
fn missing_local_image_names_the_path() {
    let tmp = TempDir::new().unwrap();
    let resolver = disk_resolver(tmp.path(), &tmp.path().join("cache"));
    let err = resolver
        .resolve_image(&local_image("images/nope.png"))
        .unwrap_err();
    assert!(err.to_string().contains("nope.png"), "{}", err);
    assert_eq!(resolver.misses(), 0);
    assert!(!tmp.path().join("cache").exists());
}

#[test]
fn cached_audio_skips_ffmpeg() {
    let tmp = TempDir::new().unwrap();
    let cache_dir = tmp.path().join("cache");
    let url = "https://www.youtube.com/watch?v=abc";
    let clip = connect_media::images::encode_data_uri("audio/mpeg", b"ID3 clip");
    DiskCache::new(&cache_dir)
        .put(&CacheKey::audio(url, 30, 10), &clip)
        .unwrap();

    let resolver = disk_resolver(tmp.path(), &cache_dir);
    let request = AudioRequest {
        source: MediaSource::Remote(url.to_owned()),
        start: 30,
        duration: 10,
    };
    assert_eq!(resolver.resolve_audio(&request).unwrap(), clip);

    // Different window: not cached, and the tools do not exist.
    let other = AudioRequest {
        start: 31,
        ..request
    };
    assert!(resolver.resolve_audio(&other).is_err());
}

#[test]
fn compile_embeds_fitted_images_from_memory() {
    let mut script = String::from("!wall_life_token images/heart.png\n!connections\n");
    script.push_str("-Pets\nimages/cat.png\nCat\n`b\n`c\n`d\n");
    for p in 1..6 {
        script.push_str(&format!("-P{p}\na\nb\nc\nd\n"));
    }
    script.push_str("!sequences\n");
    for p in 0..6 {
        script.push_str(&format!("-S{p}\na\nb\nc\nd\n"));
    }
    script.push_str("!walls\n");
    for g in 0..8 {
        script.push_str(&format!("-G{g}\nimages/cat.png\nb\nc\nd\n"));
    }
    script.push_str("!vowels\n");

    let provider = InMemoryProvider::new()
        .with_file("/quiz/in.txt", script)
        .with_file("/quiz/images/cat.png", png_bytes(512, 512))
        .with_file("/quiz/images/heart.png", png_bytes(32, 32));
    let resolver = CachingResolver::new(
        MemoryCache::new(),
        Box::new(
            InMemoryProvider::new()
                .with_file("/quiz/images/cat.png", png_bytes(512, 512))
                .with_file("/quiz/images/heart.png", png_bytes(32, 32)),
        ),
        "/quiz",
        ImageResolver::new(256, "connect-maker-tests"),
        no_audio_tools(),
    );

    let doc = compile_with_provider(Path::new("/quiz/in.txt"), &provider, &resolver).unwrap();
    match &doc.connections[0].clues[0] {
        Clue::Image { data, caption } => {
            assert_eq!(data.mime(), "image/png");
            assert_eq!(caption.as_deref(), Some("Cat"));
        }
        other => panic!("expected image clue, got {:?}", other),
    }
    assert!(matches!(doc.meta.wall_life_token, Some(Clue::Image { caption: None, .. })));
    // one miss for each distinct image, every repeat is a hit
    assert_eq!(resolver.misses(), 2);
    assert_eq!(resolver.hits(), 8);
    assert_eq!(resolver.cache().len(), 2);
}
