//! Standard-library interfaces that resolve without a Go installation.
//!
//! Each entry is Go source for a subset of a standard package, parsed on
//! demand like any file read from disk. A name that is not declared here
//! falls through to the real package directory.

const IO: &str = r#"package io

type Reader interface {
	Read(p []byte) (n int, err error)
}

type Writer interface {
	Write(p []byte) (n int, err error)
}

type Closer interface {
	Close() error
}

type Seeker interface {
	Seek(offset int64, whence int) (int64, error)
}

type ReadWriter interface {
	Reader
	Writer
}

type ReadCloser interface {
	Reader
	Closer
}

type WriteCloser interface {
	Writer
	Closer
}

type ReadWriteCloser interface {
	Reader
	Writer
	Closer
}

type ReadSeeker interface {
	Reader
	Seeker
}

type ReadSeekCloser interface {
	Reader
	Seeker
	Closer
}

type WriteSeeker interface {
	Writer
	Seeker
}

type ReadWriteSeeker interface {
	Reader
	Writer
	Seeker
}

type ReaderFrom interface {
	ReadFrom(r Reader) (n int64, err error)
}

type WriterTo interface {
	WriteTo(w Writer) (n int64, err error)
}

type ReaderAt interface {
	ReadAt(p []byte, off int64) (n int, err error)
}

type WriterAt interface {
	WriteAt(p []byte, off int64) (n int, err error)
}

type ByteReader interface {
	ReadByte() (byte, error)
}

type ByteScanner interface {
	ByteReader
	UnreadByte() error
}

type ByteWriter interface {
	WriteByte(c byte) error
}

type RuneReader interface {
	ReadRune() (r rune, size int, err error)
}

type RuneScanner interface {
	RuneReader
	UnreadRune() error
}

type StringWriter interface {
	WriteString(s string) (n int, err error)
}
"#;

const FMT: &str = r#"package fmt

type State interface {
	Write(b []byte) (n int, err error)
	Width() (wid int, ok bool)
	Precision() (prec int, ok bool)
	Flag(c int) bool
}

type Formatter interface {
	Format(f State, verb rune)
}

type Stringer interface {
	String() string
}

type GoStringer interface {
	GoString() string
}
"#;

const SORT: &str = r#"package sort

type Interface interface {
	Len() int
	Less(i, j int) bool
	Swap(i, j int)
}
"#;

const HASH: &str = r#"package hash

import "io"

type Hash interface {
	io.Writer
	Sum(b []byte) []byte
	Reset()
	Size() int
	BlockSize() int
}

type Hash32 interface {
	Hash
	Sum32() uint32
}

type Hash64 interface {
	Hash
	Sum64() uint64
}
"#;

const ENCODING: &str = r#"package encoding

type BinaryMarshaler interface {
	MarshalBinary() (data []byte, err error)
}

type BinaryUnmarshaler interface {
	UnmarshalBinary(data []byte) error
}

type TextMarshaler interface {
	MarshalText() (text []byte, err error)
}

type TextUnmarshaler interface {
	UnmarshalText(text []byte) error
}
"#;

const CONTEXT: &str = r#"package context

import "time"

type Context interface {
	Deadline() (deadline time.Time, ok bool)
	Done() <-chan struct{}
	Err() error
	Value(key any) any
}
"#;

const NET_HTTP: &str = r#"package http

type Handler interface {
	ServeHTTP(ResponseWriter, *Request)
}

type ResponseWriter interface {
	Header() Header
	Write([]byte) (int, error)
	WriteHeader(statusCode int)
}

type Flusher interface {
	Flush()
}

type RoundTripper interface {
	RoundTrip(*Request) (*Response, error)
}
"#;

const FLAG: &str = r#"package flag

type Value interface {
	String() string
	Set(string) error
}

type Getter interface {
	Value
	Get() any
}
"#;

const PACKAGES: &[(&str, &str)] = &[
    ("context", CONTEXT),
    ("encoding", ENCODING),
    ("flag", FLAG),
    ("fmt", FMT),
    ("hash", HASH),
    ("io", IO),
    ("net/http", NET_HTTP),
    ("sort", SORT),
];

/// Embedded source for `import_path`, if it is a prelude package.
pub fn source(import_path: &str) -> Option<&'static str> {
    PACKAGES
        .iter()
        .find(|(p, _)| *p == import_path)
        .map(|&(_, src)| src)
}

pub fn packages() -> impl Iterator<Item = &'static str> {
    PACKAGES.iter().map(|&(p, _)| p)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_prelude_package_parses() {
        for path in packages() {
            let src = source(path).unwrap();
            let parsed = goimpl_parser::parse_file(src)
                .unwrap_or_else(|e| panic!("{path}: {e}"));
            let last = path.rsplit('/').next().unwrap();
            assert_eq!(parsed.package_name(), last);
            assert!(!parsed.type_specs().is_empty());
        }
    }

    #[test]
    fn packages_are_sorted() {
        let paths: Vec<_> = packages().collect();
        let mut sorted = paths.clone();
        sorted.sort();
        assert_eq!(paths, sorted);
    }
}
