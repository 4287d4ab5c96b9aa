use std::collections::BTreeMap;

use core_vg::{
    compile_advanced_layer_filters, compile_category_layer_filters,
    taxonomy::{ClassEntry, CoarseClass, TaxonomyData},
    ColorOverrides, Taxonomy,
};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use vg_schema::{CategoryFilter, Granularity, FALLBACK_COLOR};

/// `coarse` classes, each with `fanout` medium children and `fanout` fine
/// children per medium code.
fn synthetic_taxonomy(coarse: u32, fanout: u32) -> Taxonomy {
    let categories = (0..=10).map(|id| (id, format!("category {id}"))).collect();
    let mut data = TaxonomyData {
        categories,
        coarse: BTreeMap::new(),
        medium: BTreeMap::new(),
        fine: BTreeMap::new(),
    };
    for c in 1..=coarse {
        data.coarse.insert(
            c,
            CoarseClass {
                category: c % 10,
                name: format!("coarse {c}"),
                color: Some(format!("#{:06x}", c * 4_099 % 0xff_ffff)),
            },
        );
        for m in 1..=fanout {
            let medium = c * 100 + m;
            data.medium.insert(
                medium,
                ClassEntry {
                    name: format!("medium {medium}"),
                    color: None,
                },
            );
            for f in 1..=fanout {
                let fine = medium * 100 + f;
                data.fine.insert(
                    fine,
                    ClassEntry {
                        name: format!("fine {fine}"),
                        color: Some(format!("#{:06x}", fine % 0xff_ffff)),
                    },
                );
            }
        }
    }
    Taxonomy::from_data(data).expect("synthetic taxonomy should validate")
}

fn bench_filters(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_compile");

    for fanout in [4u32, 16, 48] {
        let taxonomy = synthetic_taxonomy(60, fanout);

        group.bench_with_input(
            BenchmarkId::new("advanced_mixed", fanout),
            &taxonomy,
            |b, taxonomy| {
                b.iter(|| {
                    compile_advanced_layer_filters(
                        taxonomy,
                        black_box("3, 1205**, 4401, 580102, 99"),
                    )
                })
            },
        );

        group.bench_with_input(
            BenchmarkId::new("category_natural", fanout),
            &taxonomy,
            |b, taxonomy| {
                b.iter(|| compile_category_layer_filters(taxonomy, black_box(CategoryFilter::Natural)))
            },
        );

        group.bench_with_input(
            BenchmarkId::new("recolor_fine", fanout),
            &taxonomy,
            |b, taxonomy| {
                b.iter_batched(
                    || ColorOverrides::from_taxonomy(taxonomy, FALLBACK_COLOR),
                    |mut colors| {
                        colors.set_code_color(10_101, Granularity::Fine, "#123456");
                        colors.build_fill_color_match_expression(Granularity::Fine)
                    },
                    BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

criterion_group!(filter_benches, bench_filters);
criterion_main!(filter_benches);
