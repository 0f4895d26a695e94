use pgrkam_core::traits::Embedder;
use pgrkam_embed::{get_default_embedder, FakeEmbedder, FAKE_DIM};

#[test]
fn fake_embedder_shapes_and_determinism() {
    let embedder = FakeEmbedder::new(FAKE_DIM);
    let texts = vec!["clerk jobs in Mohali".to_string(), "clerk jobs in Mohali".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), FAKE_DIM);
    assert_eq!(embedder.dim(), FAKE_DIM);

    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn fake_embedder_separates_unrelated_texts() {
    let embedder = FakeEmbedder::new(FAKE_DIM);
    let embs = embedder
        .embed_batch(&["skill development courses".to_string(), "skill development courses".to_string(), "foreign study counselling".to_string()])
        .unwrap();
    let same: f32 = embs[0].iter().zip(&embs[1]).map(|(a, b)| a * b).sum();
    let other: f32 = embs[0].iter().zip(&embs[2]).map(|(a, b)| a * b).sum();
    assert!(same > other, "same={same} other={other}");
}

#[test]
fn env_flag_selects_fake_embedder() {
    std::env::set_var("APP_USE_FAKE_EMBEDDINGS", "1");
    let embedder = get_default_embedder(std::path::Path::new("/no/model/here"), 128).expect("embedder");
    assert_eq!(embedder.dim(), FAKE_DIM);
    assert_eq!(embedder.embed_batch(&[]).unwrap().len(), 0);
}
