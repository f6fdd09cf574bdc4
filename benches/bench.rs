// Criterion benchmarks for Recruit Algo

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use recruit_algo::core::{normalize_text, LoginThrottle, Matcher, RankOptions, RequirementSet};
use recruit_algo::models::CandidateProfile;

const REQUIREMENTS: &str = "React, TypeScript, Node, SQL, Docker, AWS, Git, Comunicación, Inglés, Scrum";

const SKILLS: [&str; 5] = [
    "React, TypeScript y Node.js",
    "SQL avanzado, Docker, AWS",
    "Gestión de proyectos con Scrum",
    "Git, inglés intermedio, comunicación efectiva",
    "Diseño gráfico y Figma",
];

fn create_candidate(id: usize) -> CandidateProfile {
    CandidateProfile {
        postulation_id: id.to_string(),
        candidate_name: format!("Candidate {}", id),
        skills: SKILLS[id % SKILLS.len()].to_string(),
        experience: format!("{} años de experiencia en desarrollo web y {}", id % 10, SKILLS[(id + 2) % SKILLS.len()]),
    }
}

fn bench_normalize(c: &mut Criterion) {
    let text = "Programación en Python, Análisis de Datos, Diseño de APIs REST, Inglés C1";
    c.bench_function("normalize_text", |b| {
        b.iter(|| normalize_text(black_box(text)));
    });
}

fn bench_single_score(c: &mut Criterion) {
    let requirements = RequirementSet::parse(REQUIREMENTS);
    let candidate = create_candidate(3);

    c.bench_function("score_single_candidate", |b| {
        b.iter(|| requirements.score(black_box(&candidate.skills), black_box(&candidate.experience)));
    });
}

fn bench_ranking(c: &mut Criterion) {
    let matcher = Matcher::new(10_000);
    let mut group = c.benchmark_group("ranking");

    for candidate_count in [10, 50, 100, 500, 1000].iter() {
        let candidates: Vec<CandidateProfile> = (0..*candidate_count).map(create_candidate).collect();

        group.bench_with_input(
            BenchmarkId::new("rank_candidates", candidate_count),
            candidate_count,
            |b, _| {
                b.iter(|| {
                    matcher.rank_candidates(
                        black_box(REQUIREMENTS),
                        black_box(candidates.clone()),
                        RankOptions::default(),
                    )
                });
            },
        );
    }

    group.finish();
}

fn bench_throttle(c: &mut Criterion) {
    let now = Utc::now();
    c.bench_function("throttle_fail_until_locked", |b| {
        b.iter(|| {
            let mut throttle = LoginThrottle::default();
            for _ in 0..5 {
                black_box(throttle.record_failure(now));
            }
            black_box(throttle.check(now))
        });
    });
}

criterion_group!(benches, bench_normalize, bench_single_score, bench_ranking, bench_throttle);

criterion_main!(benches);
