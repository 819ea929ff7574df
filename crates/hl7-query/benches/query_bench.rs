use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hl7_query::{
    Field, FieldComponent, FieldSubcomponent, QueryConfig, QueryEngine, RepeatingField, Segment,
    Strategy, Structure, StructureIndex,
};

fn mk_message(observations: usize) -> Structure {
    let pid = Segment::new("PID")
        .unwrap()
        .with_field(Field::base("1"))
        .with_field(Field::base(""))
        .with_field(Field::from_texts(["12345", "DOE", "JOHN"]))
        .with_field(Field::base(""))
        .with_field(Field::base("SMITH"));

    let mut segments = vec![pid];
    for i in 0..observations {
        let obx = Segment::new("OBX")
            .unwrap()
            .with_field(Field::base(format!("{}", i + 1)))
            .with_field(Field::base("NM"))
            .with_field(Field::from_texts([format!("{}-8", 15000 + i), "Glucose".into(), "LN".into()]))
            .with_field(Field::base(""))
            .with_field(RepeatingField::from_fields(vec![
                Field::base(format!("{}.1", i)),
                Field::base(format!("{}.2", i)),
            ]))
            .with_field(Field::composite(vec![FieldComponent::composite(vec![
                FieldSubcomponent::new("mg/dl"),
                FieldSubcomponent::new("UCUM"),
            ])]));
        segments.push(obx);
    }
    Structure::from_segments(segments)
}

fn bench_index_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_build");
    for size in [10, 100, 1_000] {
        let structure = mk_message(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &structure, |b, s| {
            b.iter(|| black_box(StructureIndex::build(black_box(s)).len()))
        });
    }
    group.finish();
}

fn bench_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_all_obx_5");
    for strategy in [Strategy::Indexed, Strategy::DirectWalk] {
        let config = QueryConfig::builder().with_strategy(strategy).build();
        let mut engine = QueryEngine::with_config(mk_message(500), config);
        group.bench_function(format!("{:?}", strategy), |b| {
            b.iter(|| black_box(engine.get_all(black_box("OBX-5")).unwrap().len()))
        });
    }
    group.finish();
}

fn bench_singular_lookup(c: &mut Criterion) {
    let mut engine = QueryEngine::new(mk_message(500));
    c.bench_function("get_exact_leaf", |b| {
        b.iter(|| black_box(engine.get(black_box("OBX[250]-6.1.2")).unwrap().is_some()))
    });
}

criterion_group!(benches, bench_index_build, bench_strategies, bench_singular_lookup);
criterion_main!(benches);
