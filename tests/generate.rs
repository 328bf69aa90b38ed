use std::fs;
use std::path::PathBuf;

use goimpl::{generate, generate_with, Config, ErrorKind, GoEnv, StaticResolver, StubBody};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

/// A scratch tree of Go packages.
struct Fixture {
    root: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            root: tempfile::tempdir().unwrap(),
        }
    }

    fn file(&self, rel: &str, src: &str) -> &Self {
        let path = self.root.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, src).unwrap();
        self
    }

    fn dir(&self, rel: &str) -> PathBuf {
        let dir = self.root.path().join(rel);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn config(&self, dest: &str) -> Config {
        Config {
            src_dir: Some(self.dir(dest)),
            body: StubBody::ZeroReturn,
            env: GoEnv::host(),
        }
    }
}

fn resolver(fx: &Fixture, paths: &[(&str, &str)]) -> StaticResolver {
    let mut r = StaticResolver::new();
    for (import_path, rel) in paths {
        r.insert(*import_path, fx.dir(rel));
    }
    r
}

#[test]
fn file_implements_read_closer() {
    let fx = Fixture::new();
    let r = StaticResolver::new();
    let out = generate_with(&r, "f *File", "io.ReadCloser", &fx.config("dest")).unwrap();
    assert_eq!(
        out.to_source(true),
        "func (f *File) Read(p []byte) (n int, err error) {\n\
         \t// TODO: implement\n\
         \treturn\n\
         }\n\
         \n\
         func (f *File) Close() error {\n\
         \t// TODO: implement\n\
         \treturn nil\n\
         }\n"
    );
}

#[test]
fn unnamed_parameters_and_results_on_an_unnamed_receiver() {
    let fx = Fixture::new();
    fx.file(
        "dest/file.go",
        "package dest\n\n\
         type ReadCloser interface {\n\
         \tRead([]byte) (int, error)\n\
         \tClose() error\n\
         }\n",
    );
    let r = StaticResolver::new();
    let out = generate_with(&r, "*File", "ReadCloser", &fx.config("dest")).unwrap();
    assert_eq!(
        out.to_source(true),
        "func (f *File) Read(b []byte) (int, error) {\n\
         \t// TODO: implement\n\
         \treturn 0, nil\n\
         }\n\
         \n\
         func (f *File) Close() error {\n\
         \t// TODO: implement\n\
         \treturn nil\n\
         }\n"
    );
}

#[test]
fn zero_method_interfaces_render_nothing() {
    let fx = Fixture::new();
    fx.file("dest/empty.go", "package dest\n\ntype Marker interface{}\n");
    let r = StaticResolver::new();
    for iface in ["interface{}", "any", "Marker"] {
        let out = generate_with(&r, "t T", iface, &fx.config("dest")).unwrap();
        assert_eq!(out.to_source(true), "", "{iface}");
    }
}

#[test]
fn foreign_embedding_imports_exactly_what_signatures_need() {
    let fx = Fixture::new();
    fx.file(
        "a/a.go",
        "package a\n\n\
         import (\n\t\"context\"\n\n\t\"example.com/b\"\n)\n\n\
         type Foo interface {\n\
         \tb.Bar\n\
         \tBaz(ctx context.Context) error\n\
         }\n",
    )
    .file(
        "b/b.go",
        "package b\n\n\
         import \"time\"\n\n\
         type Bar interface {\n\
         \tWait(time.Duration) bool\n\
         \tNext() *Item\n\
         }\n\n\
         type Item struct{}\n",
    );
    let r = resolver(&fx, &[("example.com/a", "a"), ("example.com/b", "b")]);
    let out = generate_with(&r, "x *X", "example.com/a.Foo", &fx.config("dest")).unwrap();
    let paths: Vec<&str> = out.imports.iter().map(|i| i.path.as_str()).collect();
    assert_eq!(paths, ["context", "example.com/b", "time"]);
    assert_eq!(
        out.stubs,
        "func (x *X) Baz(ctx context.Context) error {\n\
         \t// TODO: implement\n\
         \treturn nil\n\
         }\n\
         \n\
         func (x *X) Wait(d time.Duration) bool {\n\
         \t// TODO: implement\n\
         \treturn false\n\
         }\n\
         \n\
         func (x *X) Next() *b.Item {\n\
         \t// TODO: implement\n\
         \treturn nil\n\
         }\n"
    );
}

#[test]
fn import_names_follow_the_package_clause() {
    let fx = Fixture::new();
    fx.file(
        "a/a.go",
        "package a\n\n\
         import (\n\t\"example.com/lib/v8api\"\n\t\"github.com/nats-io/nats.go\"\n)\n\n\
         type Handler interface {\n\
         \tHandle(m *nats.Msg) error\n\
         \tDial(addr string) (*api.Conn, error)\n\
         }\n",
    )
    .file("nats/nats.go", "package nats\n\ntype Msg struct{}\n")
    .file("api/api.go", "package api\n\ntype Conn struct{}\n");
    let r = resolver(
        &fx,
        &[
            ("example.com/a", "a"),
            ("github.com/nats-io/nats.go", "nats"),
            ("example.com/lib/v8api", "api"),
        ],
    );
    let out = generate_with(&r, "h *H", "example.com/a.Handler", &fx.config("dest")).unwrap();
    assert_eq!(
        out.to_source(true),
        "import (\n\
         \tapi \"example.com/lib/v8api\"\n\
         \t\"github.com/nats-io/nats.go\"\n\
         )\n\
         \n\
         func (h *H) Handle(m *nats.Msg) error {\n\
         \t// TODO: implement\n\
         \treturn nil\n\
         }\n\
         \n\
         func (h *H) Dial(addr string) (*api.Conn, error) {\n\
         \t// TODO: implement\n\
         \treturn nil, nil\n\
         }\n"
    );

    // A qualifier no import explains is still an error.
    fx.file(
        "b/b.go",
        "package b\n\nimport \"example.com/lib/v8api\"\n\ntype Bad interface { Get() *rpc.Conn }\n",
    );
    let r = resolver(&fx, &[("example.com/b", "b"), ("example.com/lib/v8api", "api")]);
    let err = generate_with(&r, "h *H", "example.com/b.Bad", &fx.config("dest")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(err.to_string().contains("\"rpc\""), "{err}");
}

#[test]
fn diamonds_merge_or_conflict() {
    let fx = Fixture::new();
    fx.file(
        "dest/d.go",
        "package dest\n\n\
         type Base interface { Close() error }\n\
         type Left interface { Base; Left() }\n\
         type Right interface { Base; Right() }\n\
         type Both interface { Left; Right }\n\
         type Other interface { Close() }\n\
         type Clash interface { Left; Other }\n",
    );
    let r = StaticResolver::new();
    let out = generate_with(&r, "b *B", "Both", &fx.config("dest")).unwrap();
    assert_eq!(out.stubs.matches("Close()").count(), 1);

    let err = generate_with(&r, "b *B", "Clash", &fx.config("dest")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    let msg = err.to_string();
    assert!(msg.contains("Base") && msg.contains("Other"), "{msg}");
}

#[test]
fn mutual_embedding_is_a_cycle() {
    let fx = Fixture::new();
    fx.file("dest/c.go", "package dest\n\ntype A interface { B }\ntype B interface { A }\n");
    let r = StaticResolver::new();
    let err = generate_with(&r, "t T", "A", &fx.config("dest")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cycle);
}

#[test]
fn output_is_deterministic() {
    let fx = Fixture::new();
    fx.file(
        "dest/x.go",
        "package dest\n\n\
         import (\n\t\"crypto/rand\"\n\tmrand \"math/rand\"\n)\n\n\
         type Gen interface {\n\
         \tSeed(*mrand.Rand, rand.Reader, []byte, []byte) (int, error)\n\
         \tfmt.Stringer\n\
         }\n",
    );
    fx.file("dest/y.go", "package dest\n\nimport \"fmt\"\n\ntype Unused fmt.Stringer\n");
    let r = StaticResolver::new();
    let first = generate_with(&r, "*Impl", "Gen", &fx.config("dest"));
    // `fmt` is not imported by x.go.
    assert_eq!(first.unwrap_err().kind(), ErrorKind::NotFound);

    fx.file(
        "dest/x.go",
        "package dest\n\n\
         import (\n\t\"crypto/rand\"\n\t\"fmt\"\n\tmrand \"math/rand\"\n)\n\n\
         type Gen interface {\n\
         \tSeed(*mrand.Rand, rand.Reader, []byte, []byte) (int, error)\n\
         \tfmt.Stringer\n\
         }\n",
    );
    let runs: Vec<String> = (0..5)
        .map(|_| {
            generate_with(&r, "*Impl", "Gen", &fx.config("dest"))
                .unwrap()
                .to_source(true)
        })
        .collect();
    assert!(runs.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(
        runs[0],
        "import (\n\
         \t\"crypto/rand\"\n\
         \tmrand \"math/rand\"\n\
         )\n\
         \n\
         func (i *Impl) Seed(r *mrand.Rand, r1 rand.Reader, b []byte, b1 []byte) (int, error) {\n\
         \t// TODO: implement\n\
         \treturn 0, nil\n\
         }\n\
         \n\
         func (i *Impl) String() string {\n\
         \t// TODO: implement\n\
         \treturn \"\"\n\
         }\n"
    );
}

#[test]
fn doc_comments_are_carried_over() {
    let fx = Fixture::new();
    fx.file(
        "dest/doc.go",
        "package dest\n\n\
         // Cache stores things.\n\
         type Cache interface {\n\
         \t// Get returns the cached value for key.\n\
         \t// The second result reports whether it was found.\n\
         \tGet(key string) (any, bool)\n\n\
         \tPurge() // trailing comments are not docs\n\
         }\n",
    );
    let r = StaticResolver::new();
    let out = generate_with(&r, "c *lru", "Cache", &fx.config("dest")).unwrap();
    assert_eq!(
        out.stubs,
        "// Get returns the cached value for key.\n\
         // The second result reports whether it was found.\n\
         func (c *lru) Get(key string) (any, bool) {\n\
         \t// TODO: implement\n\
         \treturn nil, false\n\
         }\n\
         \n\
         func (c *lru) Purge() {\n\
         \t// TODO: implement\n\
         }\n"
    );
}

#[test]
fn generic_interfaces_are_instantiated_or_kept() {
    let fx = Fixture::new();
    fx.file(
        "coll/coll.go",
        "package coll\n\n\
         type Container[T any] interface {\n\
         \tAdd(items ...T)\n\
         \tAll() []T\n\
         }\n\n\
         type Store[K comparable, V any] interface {\n\
         \tContainer[V]\n\
         \tLookup(K) (V, bool)\n\
         }\n",
    );
    let r = resolver(&fx, &[("example.com/coll", "coll")]);

    let out = generate_with(&r, "s *Set[T]", "example.com/coll.Container[T]", &fx.config("dest")).unwrap();
    assert!(out.stubs.contains("func (s *Set[T]) Add(items ...T) {"));
    assert!(out.stubs.contains("func (s *Set[T]) All() []T {\n\t// TODO: implement\n\treturn nil\n}"));

    let out = generate_with(&r, "m *Map", "example.com/coll.Store[string, *Item]", &fx.config("dest"))
        .unwrap();
    assert!(out.stubs.contains("func (m *Map) Lookup(s string) (*Item, bool) {"));
    assert!(out.stubs.contains("func (m *Map) Add(items ...*Item) {"));

    let err = generate_with(&r, "m *Map", "example.com/coll.Store[string]", &fx.config("dest"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeArgs);
}

#[test]
fn panic_bodies() {
    let fx = Fixture::new();
    let r = StaticResolver::new();
    let mut config = fx.config("dest");
    config.body = StubBody::Panic;
    let out = generate_with(&r, "s Sorter", "sort.Interface", &config).unwrap();
    assert_eq!(
        out.stubs,
        "func (s Sorter) Len() int {\n\
         \tpanic(\"not implemented\") // TODO: Implement\n\
         }\n\
         \n\
         func (s Sorter) Less(i int, j int) bool {\n\
         \tpanic(\"not implemented\") // TODO: Implement\n\
         }\n\
         \n\
         func (s Sorter) Swap(i int, j int) {\n\
         \tpanic(\"not implemented\") // TODO: Implement\n\
         }\n"
    );
}

#[test]
fn error_kinds() {
    let fx = Fixture::new();
    fx.file(
        "dest/t.go",
        "package dest\n\ntype Point struct{ X, Y int }\ntype Num interface { ~int | ~float64 }\n",
    )
    .file("broken/b.go", "package broken\n\ntype X interface {\n");
    let r = resolver(&fx, &[("example.com/broken", "broken"), ("example.com/empty", "empty")]);
    let cfg = fx.config("dest");
    let kind = |recv: &str, iface: &str| generate_with(&r, recv, iface, &cfg).unwrap_err().kind();

    assert_eq!(kind("f *File", "Point"), ErrorKind::NotAnInterface);
    assert_eq!(kind("f *File", "Num"), ErrorKind::NotAnInterface);
    assert_eq!(kind("f *File", "Missing"), ErrorKind::NotFound);
    assert_eq!(kind("f *File", "example.com/nowhere.X"), ErrorKind::NotFound);
    assert_eq!(kind("f *File", "example.com/empty.X"), ErrorKind::NotFound);
    assert_eq!(kind("f *File", "example.com/broken.X"), ErrorKind::Parse);
    assert_eq!(kind("f *File", "io.Reader[int"), ErrorKind::InvalidRef);
    assert_eq!(kind("f *", "io.Reader"), ErrorKind::Unrenderable);
    assert_eq!(kind("a, b File", "io.Reader"), ErrorKind::Unrenderable);
    assert_eq!(kind("", "io.Reader"), ErrorKind::Unrenderable);
}

#[test]
fn parse_errors_point_at_the_file() {
    let fx = Fixture::new();
    fx.file("broken/b.go", "package broken\n\ntype X interface {\n\tM(\n}\n");
    let r = resolver(&fx, &[("example.com/broken", "broken")]);
    let err = generate_with(&r, "t T", "example.com/broken.X", &fx.config("dest")).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("b.go:"), "{msg}");
}

#[test]
fn platform_files_are_filtered() {
    let fx = Fixture::new();
    let goos = GoEnv::host().goos;
    let other = if goos == "windows" { "linux" } else { "windows" };
    fx.file("dest/api.go", "package dest\n")
        .file(
            &format!("dest/api_{goos}.go"),
            "package dest\n\ntype Sys interface { Native() }\n",
        )
        .file(
            &format!("dest/api_{other}.go"),
            "package dest\n\ntype Sys interface { Foreign() }\n",
        )
        .file("dest/api_test.go", "package dest\n\ntype Test interface { T() }\n")
        .file(
            "dest/ignored.go",
            "//go:build ignore\n\npackage dest\n\ntype Ignored interface { I() }\n",
        );
    let r = StaticResolver::new();
    let cfg = fx.config("dest");
    let out = generate_with(&r, "s S", "Sys", &cfg).unwrap();
    assert!(out.stubs.contains("Native()"));
    assert!(!out.stubs.contains("Foreign()"));
    for hidden in ["Test", "Ignored"] {
        let err = generate_with(&r, "s S", hidden, &cfg).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound, "{hidden}");
    }
}

#[test]
fn modules_resolve_through_go_mod() {
    let fx = Fixture::new();
    fx.file(
        "app/go.mod",
        "module example.com/app\n\ngo 1.22\n\nreplace example.com/lib => ../lib\n",
    )
    .file(
        "app/store/store.go",
        "package store\n\n\
         import \"example.com/lib/model\"\n\n\
         type Store interface {\n\
         \tSave(model.Record) error\n\
         \tLoad(id string) (*Entry, error)\n\
         }\n\n\
         type Entry struct{}\n",
    )
    .file("app/cmd/main.go", "package main\n")
    .file("lib/model/model.go", "package model\n\ntype Record struct{}\n");

    let env = GoEnv {
        goroot: Some(fx.dir("goroot")),
        gopath: vec![fx.dir("gopath")],
        ..GoEnv::host()
    };
    let config = Config {
        src_dir: Some(fx.dir("app/cmd")),
        body: StubBody::ZeroReturn,
        env,
    };
    let out = generate("d *disk", "example.com/app/store.Store", &config).unwrap();
    assert_eq!(
        out.to_source(true),
        "import (\n\
         \t\"example.com/app/store\"\n\
         \t\"example.com/lib/model\"\n\
         )\n\
         \n\
         func (d *disk) Save(r model.Record) error {\n\
         \t// TODO: implement\n\
         \treturn nil\n\
         }\n\
         \n\
         func (d *disk) Load(id string) (*store.Entry, error) {\n\
         \t// TODO: implement\n\
         \treturn nil, nil\n\
         }\n"
    );

    // Inside the store package itself the same types need no qualifier.
    let config = Config {
        src_dir: Some(fx.dir("app/store")),
        ..config
    };
    let out = generate("d *disk", "Store", &config).unwrap();
    assert!(out.stubs.contains("Load(id string) (*Entry, error)"));
    assert_eq!(out.imports.len(), 1);
}

#[test]
fn vendored_packages_shadow_everything_else() {
    let fx = Fixture::new();
    fx.file(
        "proj/vendor/example.com/dep/dep.go",
        "package dep\n\ntype Pinger interface { Ping() error }\n",
    )
    .file("proj/main.go", "package main\n");
    let config = Config {
        src_dir: Some(fx.dir("proj")),
        body: StubBody::ZeroReturn,
        env: GoEnv {
            goroot: Some(fx.dir("goroot")),
            ..GoEnv::host()
        },
    };
    let out = generate("p P", "example.com/dep.Pinger", &config).unwrap();
    assert!(out.stubs.contains("func (p P) Ping() error {"));
}
