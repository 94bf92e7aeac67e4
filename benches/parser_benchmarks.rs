use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use vyatta_conf::{LexerConfig, LineClassifier, parse_conf};

/// Generate an interfaces/firewall document with `count` interfaces and rules
fn generate_router_config(count: usize) -> String {
    let mut config = String::from("interfaces {\n");
    for i in 0..count {
        config.push_str(&format!(
            "    ethernet eth{i} {{\n        address 10.{a}.{b}.1/24\n        address 10.{a}.{b}.2/24\n        description \"port {i} (uplink #{i})\"\n        duplex auto\n        speed auto\n    }}\n",
            i = i,
            a = i / 256,
            b = i % 256
        ));
    }
    config.push_str("}\nfirewall {\n    name WAN_IN {\n        default-action drop\n");
    for i in 0..count {
        config.push_str(&format!(
            "        rule {} {{\n            action accept\n            destination {{\n                port {}\n            }}\n            protocol tcp\n        }}\n",
            (i + 1) * 10,
            1024 + i
        ));
    }
    config.push_str("    }\n}\n/* Warning: Do not remove the following line. */\n");
    config
}

/// Generate a chain of `depth` nested blocks
fn generate_nested_config(depth: usize) -> String {
    let mut config = String::new();
    for i in 0..depth {
        config.push_str(&format!("{}level {} {{\n", "    ".repeat(i), i));
    }
    config.push_str(&format!("{}leaf value\n", "    ".repeat(depth)));
    for i in (0..depth).rev() {
        config.push_str(&format!("{}}}\n", "    ".repeat(i)));
    }
    config
}

fn benchmark_parse_conf(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_conf");

    for count in [10, 100, 1000] {
        let config = generate_router_config(count);
        group.throughput(Throughput::Bytes(config.len() as u64));
        group.bench_with_input(BenchmarkId::new("router", count), &config, |b, config| {
            b.iter(|| parse_conf(black_box(config)).unwrap())
        });
    }

    for depth in [8, 32, 64] {
        let config = generate_nested_config(depth);
        group.bench_with_input(BenchmarkId::new("nested", depth), &config, |b, config| {
            b.iter(|| parse_conf(black_box(config)).unwrap())
        });
    }

    group.finish();
}

fn benchmark_line_classifier(c: &mut Criterion) {
    let config = generate_router_config(1000);
    let mut group = c.benchmark_group("line_classifier");
    group.throughput(Throughput::Bytes(config.len() as u64));

    group.bench_function("classify_only", |b| {
        b.iter(|| {
            LineClassifier::with_config(black_box(&config), LexerConfig::default())
                .filter_map(Result::ok)
                .count()
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_parse_conf, benchmark_line_classifier);
criterion_main!(benches);
