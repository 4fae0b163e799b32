use chrono::{Duration, TimeZone, Utc};
use criterion::{criterion_group, criterion_main, Criterion};
use polyglot_tracker::models::{Difficulty, Flashcard, Progress, ProgressKind};
use polyglot_tracker::services::scheduling::{build_study_queue, next_review_at};
use std::collections::HashMap;
use std::hint::black_box;

const DECK_SIZE: u32 = 5_000;

fn benchmark_study_queue(c: &mut Criterion) {
    let now = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();

    let cards: Vec<Flashcard> = (0..DECK_SIZE)
        .map(|i| Flashcard {
            id: format!("card-{}", i),
            deck_id: "bench".to_string(),
            front: format!("front {}", i),
            back: format!("back {}", i),
            example: None,
            position: i,
        })
        .collect();

    // Two thirds of the deck has been reviewed at staggered times.
    let progress: HashMap<String, Progress> = cards
        .iter()
        .filter(|card| card.position % 3 != 0)
        .map(|card| {
            let difficulty = match card.position % 3 {
                1 => Difficulty::Hard,
                _ => Difficulty::Medium,
            };
            let reviewed = now - Duration::hours(i64::from(card.position % 200));
            let mut p = Progress::new("bench-user", ProgressKind::Flashcard, &card.id, reviewed);
            p.difficulty = Some(difficulty);
            p.review_count = 1;
            p.next_review_at = Some(next_review_at(difficulty, reviewed));
            (card.id.clone(), p)
        })
        .collect();

    let mut group = c.benchmark_group("study_queue");

    group.bench_function("mixed_deck_limit_50", |b| {
        b.iter(|| build_study_queue(black_box(&cards), black_box(&progress), now, 50))
    });

    group.bench_function("new_deck_limit_50", |b| {
        b.iter(|| build_study_queue(black_box(&cards), black_box(&HashMap::new()), now, 50))
    });

    group.finish();
}

criterion_group!(benches, benchmark_study_queue);
criterion_main!(benches);
