use std::path::PathBuf;

/// What each generated method body does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StubBody {
    /// `// TODO: implement` followed by a `return` of zero values.
    #[default]
    ZeroReturn,
    /// `panic("not implemented") // TODO: Implement`
    Panic,
}

/// The parts of the Go toolchain environment that package resolution needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoEnv {
    pub goroot: Option<PathBuf>,
    pub gopath: Vec<PathBuf>,
    pub gomodcache: Option<PathBuf>,
    pub goos: String,
    pub goarch: String,
}

impl GoEnv {
    /// Reads `GOROOT`, `GOPATH`, `GOMODCACHE`, `GOOS` and `GOARCH`, falling
    /// back to the host platform and `$HOME/go` the way the go tool does.
    pub fn from_env() -> Self {
        let var = |k: &str| std::env::var_os(k).filter(|v| !v.is_empty());

        let gopath: Vec<PathBuf> = match var("GOPATH") {
            Some(v) => std::env::split_paths(&v).collect(),
            None => dirs::home_dir()
                .map(|h| vec![h.join("go")])
                .unwrap_or_default(),
        };

        let goos = var("GOOS")
            .and_then(|v| v.into_string().ok())
            .unwrap_or_else(|| host_goos().to_string());
        let goarch = var("GOARCH")
            .and_then(|v| v.into_string().ok())
            .unwrap_or_else(|| host_goarch().to_string());

        Self {
            goroot: var("GOROOT").map(PathBuf::from),
            gopath,
            gomodcache: var("GOMODCACHE").map(PathBuf::from),
            goos,
            goarch,
        }
    }

    /// Host platform only, with no search paths.
    pub fn host() -> Self {
        Self {
            goos: host_goos().to_string(),
            goarch: host_goarch().to_string(),
            ..Self::default()
        }
    }

    /// `$GOMODCACHE`, or `$GOPATH[0]/pkg/mod`.
    pub fn module_cache(&self) -> Option<PathBuf> {
        self.gomodcache
            .clone()
            .or_else(|| self.gopath.first().map(|p| p.join("pkg").join("mod")))
    }
}

fn host_goos() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    }
}

fn host_goarch() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "x86" => "386",
        "aarch64" => "arm64",
        "powerpc64" if cfg!(target_endian = "little") => "ppc64le",
        "powerpc64" => "ppc64",
        "loongarch64" => "loong64",
        "riscv64" => "riscv64",
        other => other,
    }
}

/// Everything a generation run needs besides the receiver and interface text.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Directory of the destination package. Also searched for vendored
    /// packages. Defaults to the current directory.
    pub src_dir: Option<PathBuf>,
    pub body: StubBody,
    pub env: GoEnv,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            env: GoEnv::from_env(),
            ..Self::default()
        }
    }
}
