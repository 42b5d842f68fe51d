use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::fmt::Write;
use yang_core::analyze;
use yang_core::lexer::Lexer;
use yang_core::parser::Parser;

// ============================================================================
// Test Data
// ============================================================================

const TINY_YANG: &str = r"
module tiny {
  namespace urn:tiny;
  prefix t;
}
";

const SMALL_YANG: &str = r#"
module small {
  namespace "urn:small";
  prefix s;
  revision 2023-01-01;

  typedef percent {
    type uint8 { range "0..100"; }
  }

  container system {
    leaf hostname { type string; }
    leaf load { type percent; }
  }
}
"#;

const MEDIUM_YANG: &str = r#"
module medium {
  yang-version 1.1;
  namespace "urn:medium";
  prefix m;
  organization "Benchmarks";
  revision 2023-06-01 { description "Second."; }
  revision 2023-01-01 { description "First."; }

  typedef name-t {
    type string { length "1..64"; pattern "[a-z][a-z0-9-]*"; }
  }
  typedef port-t {
    type uint16 { range "1..65535"; }
  }

  grouping endpoint {
    leaf address { type string; }
    leaf port { type port-t; default 830; }
  }

  container interfaces {
    list interface {
      key "name";
      leaf name { type name-t; }
      leaf enabled { type boolean; default true; }
      leaf mtu { type uint16 { range "68..9000"; } }
      container peer {
        uses endpoint {
          refine port { default 22; }
        }
      }
    }
  }

  rpc reset {
    input { leaf target { type name-t; } }
    output { leaf status { type string; } }
  }

  notification link-down {
    leaf interface { type name-t; }
  }
}
"#;

fn generate_large_yang(leaves: usize) -> String {
    let mut source = String::from(
        "module large {\n  namespace urn:large;\n  prefix l;\n  typedef counter-t { type uint64; }\n  container stats {\n",
    );
    for i in 0..leaves {
        let _ = writeln!(source, "    leaf counter-{i} {{ type counter-t; }}");
    }
    source.push_str("  }\n}\n");
    source
}

// ============================================================================
// Lexer Benchmarks
// ============================================================================

fn bench_lexer_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer_by_size");

    for (name, source) in [("tiny", TINY_YANG), ("small", SMALL_YANG), ("medium", MEDIUM_YANG)] {
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), source, |b, src| {
            b.iter(|| {
                let mut lexer = Lexer::new(black_box(src));
                lexer.lex()
            })
        });
    }

    group.finish();
}

// ============================================================================
// Parser Benchmarks
// ============================================================================

fn bench_parser_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser_by_size");

    for (name, source) in [("tiny", TINY_YANG), ("small", SMALL_YANG), ("medium", MEDIUM_YANG)] {
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), source, |b, src| {
            b.iter(|| Parser::new(black_box(src)).parse_document())
        });
    }

    group.finish();
}

fn bench_parser_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser_leaf_scaling");

    for size in [10, 100, 1000] {
        let source = generate_large_yang(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &source, |b, src| {
            b.iter(|| Parser::new(black_box(src)).parse_document())
        });
    }

    group.finish();
}

// ============================================================================
// End-to-End Benchmarks
// ============================================================================

fn bench_e2e_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("e2e_analysis");

    for (name, source) in [("tiny", TINY_YANG), ("small", SMALL_YANG), ("medium", MEDIUM_YANG)] {
        group.bench_with_input(BenchmarkId::from_parameter(name), source, |b, src| {
            b.iter(|| analyze(black_box(src), "bench.yang"))
        });
    }

    group.finish();
}

fn bench_e2e_with_serialization(c: &mut Criterion) {
    c.bench_function("e2e_medium_to_json", |b| {
        b.iter(|| {
            let result = analyze(black_box(MEDIUM_YANG), "bench.yang").ok()?;
            result.to_json().ok()
        })
    });
}

fn bench_e2e_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("e2e_leaf_scaling");

    for size in [10, 100, 1000] {
        let source = generate_large_yang(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &source, |b, src| {
            b.iter(|| analyze(black_box(src), "bench.yang"))
        });
    }

    group.finish();
}

// ============================================================================

criterion_group!(lexer_benches, bench_lexer_sizes);

criterion_group!(parser_benches, bench_parser_sizes, bench_parser_scaling);

criterion_group!(
    e2e_benches,
    bench_e2e_analysis,
    bench_e2e_with_serialization,
    bench_e2e_scaling
);

criterion_main!(lexer_benches, parser_benches, e2e_benches);
