//! Built-in language table.

use once_cell::sync::Lazy;

use super::language::{Comment, Language};

static BUILTIN_LANGUAGES: Lazy<Vec<Language>> = Lazy::new(|| {
    let hash = || Comment::line("#");
    let slashes = || Comment::line("//");
    let dashes = || Comment::line("--");
    vec![
        // C family
        Language::new("c", slashes()).with_identifiers(&["h"]),
        Language::new("cpp", slashes()).with_identifiers(&["c++", "cxx", "hpp"]),
        Language::new("csharp", slashes()).with_identifiers(&["cs", "c#"]),
        Language::new("go", slashes()),
        Language::new("java", slashes()),
        Language::new("javascript", slashes()).with_identifiers(&["js"]),
        Language::new("typescript", slashes()).with_identifiers(&["ts"]),
        Language::new("rust", slashes()).with_identifiers(&["rs"]),
        Language::new("zig", slashes()),
        Language::new("scss", slashes()).with_identifiers(&["sass"]),
        // hash comments
        Language::new("python", hash()).with_identifiers(&["py", "python3"]),
        Language::new("bash", hash()).with_identifiers(&["sh", "shell", "zsh"]),
        Language::new("julia", hash()).with_identifiers(&["jl"]),
        Language::new("make", hash()).with_identifiers(&["makefile"]),
        Language::new("r", hash()),
        Language::new("ruby", hash()).with_identifiers(&["rb"]),
        Language::new("toml", hash()),
        Language::new("yaml", hash()).with_identifiers(&["yml"]),
        // dash comments
        Language::new("haskell", dashes()).with_identifiers(&["hs"]),
        Language::new("lua", dashes()),
        Language::new("sql", dashes()),
        // lisps
        Language::new("lisp", Comment::line(";")).with_identifiers(&["cl", "elisp"]),
        Language::new("scheme", Comment::line(";")).with_identifiers(&["scm"]),
        Language::new("clojure", Comment::line(";")).with_identifiers(&["clj", "cljs"]),
        // block comments
        Language::new("css", Comment::block("/*", "*/")),
        Language::new("html", Comment::block("<!--", "-->")).with_identifiers(&["htm"]),
        Language::new("xml", Comment::block("<!--", "-->")),
        Language::new("ocaml", Comment::block("(*", "*)")).with_identifiers(&["ml"]),
        // misc
        Language::new("tex", Comment::line("%")).with_identifiers(&["latex"]),
        Language::new("fortran", Comment::line("!")).with_identifiers(&["f90", "f95"]),
    ]
});

/// Returns the list of built-in language configurations.
pub fn builtin_languages() -> &'static [Language] {
    &BUILTIN_LANGUAGES
}

/// Find a built-in language by name or identifier.
pub fn find_language(identifier: &str) -> Option<&'static Language> {
    builtin_languages()
        .iter()
        .find(|lang| lang.matches(identifier))
}
