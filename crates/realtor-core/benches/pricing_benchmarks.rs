//! Benchmarks for the pricing calculators
//!
//! Run with: cargo bench --package realtor-core

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use realtor_core::models::ServiceDetails;
use realtor_core::pricing::{
    calculate_cleaning_price, calculate_social_price, calculate_staging_fee,
    calculate_video_price, CleaningFrequency, CleaningType, PostingFrequency, PropertyType,
    SocialAddon, SubscriptionTerm, VideoAddon, VideoServiceType,
};
use rust_decimal::Decimal;

fn bench_staging(c: &mut Criterion) {
    let size = Decimal::from(2400);

    c.bench_function("staging_fee", |b| {
        b.iter(|| {
            calculate_staging_fee(
                black_box(size),
                black_box(6),
                black_box(4),
                black_box(PropertyType::Townhouse),
            )
        });
    });
}

fn bench_cleaning(c: &mut Criterion) {
    let size = Decimal::from(3200);

    c.bench_function("cleaning_price", |b| {
        b.iter(|| {
            calculate_cleaning_price(
                black_box(10),
                black_box(3),
                CleaningType::Deep,
                PropertyType::House,
                CleaningFrequency::BiWeekly,
                black_box(size),
            )
        });
    });
}

fn bench_video_and_social(c: &mut Criterion) {
    let video_addons = [VideoAddon::BilingualSubtitles, VideoAddon::VoiceOverEditing];
    let social_addons = [SocialAddon::StoryPosts, SocialAddon::AdManagement];

    c.bench_function("video_price", |b| {
        b.iter(|| {
            calculate_video_price(
                VideoServiceType::ListingVideo,
                black_box(&video_addons),
                black_box(5),
                None,
            )
        });
    });

    c.bench_function("social_price", |b| {
        b.iter(|| {
            calculate_social_price(
                PostingFrequency::FivePerWeek,
                SubscriptionTerm::Annual,
                black_box(&social_addons),
                None,
            )
        });
    });
}

/// Benchmark quoting a batch of mixed requests through the dispatcher
fn bench_quote_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("quote_batch");

    for size in [10usize, 100, 1000].iter() {
        let batch: Vec<ServiceDetails> = (0..*size)
            .map(|i| match i % 2 {
                0 => ServiceDetails::Video {
                    service_type: VideoServiceType::SocialMediaShort,
                    addons: vec![],
                    number_of_videos: (i % 7 + 1) as u32,
                    custom_price: None,
                },
                _ => ServiceDetails::Staging {
                    location: "Toronto".to_string(),
                    size: Decimal::from(800 + i as i64),
                    rooms: (i % 9) as u32,
                    months: (i % 12 + 1) as u32,
                    property_type: PropertyType::Condo,
                    occupation_status: None,
                    selling_price: None,
                    custom_price: None,
                },
            })
            .collect();

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let total: Decimal = batch
                    .iter()
                    .filter_map(|d| d.quote().ok())
                    .map(|q| q.total)
                    .sum();
                black_box(total)
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_staging,
    bench_cleaning,
    bench_video_and_social,
    bench_quote_batch
);
criterion_main!(benches);
