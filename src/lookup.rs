//! Type Lookup: finds an interface declaration by package and name.

use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::{Error, Result};
use crate::locate::{self, BuildTags, Package};
use crate::lower::{is_predeclared, Lowered, Lowerer};
use crate::model::{InterfaceDecl, Method, Param, PkgPath, Signature, TypeExpr, TypeName};
use crate::resolver::Resolver;

/// Every package loaded while generating one set of stubs, plus the
/// interfaces already lowered from them.
pub struct Workspace<'r> {
    resolver: &'r dyn Resolver,
    tags: BuildTags,
    dest_dir: Option<PathBuf>,
    dest_path: PkgPath,
    packages: FxHashMap<PkgPath, Package>,
    prelude: FxHashMap<PkgPath, Package>,
    decls: FxHashMap<TypeName, InterfaceDecl>,
}

impl<'r> Workspace<'r> {
    /// `dest_dir` is the directory the stubs are written into. Its import
    /// path comes from the resolver; when it has none it is the local package.
    pub fn new(resolver: &'r dyn Resolver, tags: BuildTags, dest_dir: Option<&Path>) -> Self {
        let dest_path = dest_dir
            .and_then(|d| resolver.import_path_of(d))
            .map_or_else(PkgPath::local, PkgPath::new);
        debug!(dest = %dest_path, "workspace");
        Self {
            resolver,
            tags,
            dest_dir: dest_dir.map(Path::to_path_buf),
            dest_path,
            packages: FxHashMap::default(),
            prelude: FxHashMap::default(),
            decls: FxHashMap::default(),
        }
    }

    /// Import path of the package receiving the stubs.
    pub fn dest_path(&self) -> &PkgPath {
        &self.dest_path
    }

    /// Loads (once) the package at `path`.
    pub fn package(&mut self, path: &PkgPath) -> Result<&Package> {
        if !self.packages.contains_key(path) {
            let pkg = if *path == self.dest_path {
                let dir = self.dest_dir.as_deref().ok_or_else(|| Error::PackageNotFound {
                    path: path.to_string(),
                })?;
                locate::load_dir(path.clone(), dir, &self.tags)?
            } else {
                locate::locate(self.resolver, path, &self.tags)?
            };
            self.packages.insert(path.clone(), pkg);
        }
        Ok(&self.packages[path])
    }

    fn prelude_package(&mut self, path: &PkgPath) -> Result<Option<&Package>> {
        if *path == self.dest_path {
            return Ok(None);
        }
        if !self.prelude.contains_key(path) {
            let Some(pkg) = locate::load_prelude(path) else {
                return Ok(None);
            };
            self.prelude.insert(path.clone(), pkg?);
        }
        Ok(self.prelude.get(path))
    }

    /// The declaration of interface `name`, lowered but not flattened.
    pub fn find_interface(&mut self, name: &TypeName) -> Result<InterfaceDecl> {
        if let Some(decl) = self.decls.get(name) {
            return Ok(decl.clone());
        }
        let decl = match &name.pkg {
            None => universe(name)?,
            Some(path) => {
                let from_prelude = match self.prelude_package(path)? {
                    Some(pkg) if pkg.find_type(&name.name).is_some() => Some(lower(pkg, name)?),
                    _ => None,
                };
                match from_prelude {
                    Some(decl) => decl,
                    None => self.lower_from_disk(path, name)?,
                }
            }
        };
        debug!(
            interface = %name,
            methods = decl.methods.len(),
            embeds = decl.embeds.len(),
            "found interface"
        );
        self.decls.insert(name.clone(), decl.clone());
        Ok(decl)
    }

    /// Lowers `name` from the package on disk. A qualifier that no import's
    /// guessed name explains is looked up by the package clause of the
    /// file's unaliased imports, the way the compiler binds it.
    fn lower_from_disk(&mut self, path: &PkgPath, name: &TypeName) -> Result<InterfaceDecl> {
        loop {
            let (qualifier, file, candidates) = {
                let pkg = self.package(path)?;
                match lower(pkg, name) {
                    Err(Error::UnknownQualifier { qualifier, file }) => {
                        let candidates = pkg
                            .files
                            .iter()
                            .find(|f| f.path == file)
                            .map(|f| f.unaliased.clone())
                            .unwrap_or_default();
                        (qualifier, file, candidates)
                    }
                    other => return other,
                }
            };

            let mut bound = None;
            for candidate in candidates {
                if self.package_name(&candidate).as_deref() == Some(qualifier.as_str()) {
                    bound = Some(candidate);
                    break;
                }
            }
            let declaring = self
                .packages
                .get_mut(path)
                .and_then(|pkg| pkg.files.iter_mut().find(|f| f.path == file));
            match (bound, declaring) {
                (Some(target), Some(f)) => {
                    debug!(
                        qualifier = %qualifier,
                        import = %target,
                        file = %file.display(),
                        "bound by package clause"
                    );
                    f.imports.insert(qualifier, target);
                }
                _ => return Err(Error::UnknownQualifier { qualifier, file }),
            }
        }
    }

    /// Package clause name of `path`, if it can be loaded at all.
    fn package_name(&mut self, path: &PkgPath) -> Option<String> {
        if let Ok(Some(pkg)) = self.prelude_package(path) {
            return Some(pkg.name.clone());
        }
        self.package(path).ok().map(|pkg| pkg.name.clone())
    }
}

fn lower(pkg: &Package, name: &TypeName) -> Result<InterfaceDecl> {
    let (file, spec) = pkg.find_type(&name.name).ok_or_else(|| Error::TypeNotFound {
        pkg: pkg.path.to_string(),
        name: name.name.clone(),
    })?;
    let mut lowerer = Lowerer {
        arena: &file.parsed.arena,
        interner: &file.parsed.interner,
        src: &file.src,
        file: &file.path,
        imports: &file.imports,
        home: pkg.path.clone(),
        home_name: Some(pkg.name.clone()),
        type_params: Vec::new(),
        used: Vec::new(),
    };
    match lowerer.type_spec(name, spec)? {
        Lowered::Interface(decl) => Ok(decl),
        Lowered::Other(found) => Err(Error::NotAnInterface {
            name: name.to_string(),
            found,
        }),
    }
}

/// `error` and `any`, the only predeclared interfaces with a method set.
fn universe(name: &TypeName) -> Result<InterfaceDecl> {
    let mut decl = InterfaceDecl::empty(name.clone());
    match name.name.as_str() {
        "any" => {}
        "error" => decl.methods.push(Method {
            name: "Error".to_string(),
            sig: Signature {
                params: Vec::new(),
                results: vec![Param {
                    name: None,
                    ty: TypeExpr::named(None, "string"),
                }],
                variadic: false,
            },
            doc: Vec::new(),
            origin: name.clone(),
        }),
        "comparable" => {
            return Err(Error::NotAnInterface {
                name: name.to_string(),
                found: "constraint interface",
            })
        }
        n if is_predeclared(n) => {
            return Err(Error::NotAnInterface {
                name: name.to_string(),
                found: "basic type",
            })
        }
        _ => {
            return Err(Error::TypeNotFound {
                pkg: "builtin".to_string(),
                name: name.name.clone(),
            })
        }
    }
    Ok(decl)
}
