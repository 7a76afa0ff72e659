use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use vdom_core::{attrs, children, h, Child, Engine, NodeId, VNode};

const ROW_COUNT_SAMPLES: &[usize] = &[16, 64, 256, 1024];

fn rows(count: usize, reversed: bool, revision: usize) -> VNode {
    let mut keys: Vec<usize> = (0..count).collect();
    if reversed {
        keys.reverse();
    }
    let items: Vec<Child> = keys
        .into_iter()
        .map(|key| {
            h(
                "li",
                Some(attrs! { "key" => key, "class" => if key % 2 == 0 { "even" } else { "odd" } }),
                children![format!("Row {key} rev {revision}")],
            )
            .into()
        })
        .collect();
    h("ul", None, items)
}

struct ReconcileFixture {
    engine: Engine,
    container: NodeId,
    root: Option<NodeId>,
    count: usize,
}

impl ReconcileFixture {
    fn new(count: usize) -> Self {
        let mut engine = Engine::new();
        let container = engine.create_container("body");
        Self {
            engine,
            container,
            root: None,
            count,
        }
    }

    fn render(&mut self, reversed: bool, revision: usize) -> NodeId {
        let root = self
            .engine
            .render(&rows(self.count, reversed, revision), self.container, self.root)
            .expect("render");
        self.root = Some(root);
        root
    }
}

fn bench_keyed_reorder(c: &mut Criterion) {
    let mut group = c.benchmark_group("keyed_reorder");
    for &count in ROW_COUNT_SAMPLES {
        group.bench_with_input(BenchmarkId::new("rows", count), &count, |b, &count| {
            let mut fixture = ReconcileFixture::new(count);
            fixture.render(false, 0);
            let mut reversed = false;
            b.iter(|| {
                reversed = !reversed;
                black_box(fixture.render(reversed, 0));
            });
        });
    }
    group.finish();
}

fn bench_text_update(c: &mut Criterion) {
    let mut fixture = ReconcileFixture::new(256);
    fixture.render(false, 0);
    let mut revision = 0;

    c.bench_function("text_update", |b| {
        b.iter(|| {
            revision += 1;
            black_box(fixture.render(false, revision));
        });
    });
}

fn bench_unchanged(c: &mut Criterion) {
    let mut fixture = ReconcileFixture::new(256);
    fixture.render(false, 0);

    c.bench_function("unchanged_rerender", |b| {
        b.iter(|| {
            black_box(fixture.render(false, 0));
        });
    });
}

criterion_group!(reconcile, bench_keyed_reorder, bench_text_update, bench_unchanged);
criterion_main!(reconcile);
