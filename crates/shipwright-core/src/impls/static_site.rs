//! StaticSiteBuilder - single-page `ArtifactBuilder`.
//!
//! Output: `index.html` (shows the `?url=` parameter, defaulting to the first
//! attachment), `README.md` (the brief), `LICENSE` (MIT).

use crate::domain::Attachment;
use crate::ports::{ArtifactBuilder, FileMap};

pub const INDEX_FILE: &str = "index.html";
pub const README_FILE: &str = "README.md";
pub const LICENSE_FILE: &str = "LICENSE";

const MIT_TEMPLATE: &str = "MIT License

Copyright (c) {year} {owner}

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the \"Software\"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED \"AS IS\", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
";

const INDEX_TEMPLATE: &str = r#"<!doctype html>
<html>
  <head><meta charset="utf-8"><meta name="viewport" content="width=device-width,initial-scale=1"><title>Task App</title></head>
  <body>
    <h1>Auto-generated task app</h1>
    <div>URL param: <span id="asset-url"></span></div>
    <div>Result: <span id="asset-result">-</span></div>
    <script>
      (() => {
        const params = new URLSearchParams(location.search);
        const url = params.get('url') || {default_asset};
        document.getElementById('asset-url').textContent = url;
        if (/\.(png|jpe?g|gif|svg)$/i.test(url)) {
          const img = document.createElement('img');
          img.src = url;
          img.alt = 'attachment';
          img.style.maxWidth = '400px';
          document.body.appendChild(img);
          setTimeout(() => document.getElementById('asset-result').textContent = 'LOADED', 1200);
        } else if (url) {
          const a = document.createElement('a');
          a.href = url;
          a.textContent = url;
          a.target = '_blank';
          document.body.appendChild(a);
        }
      })();
    </script>
  </body>
</html>
"#;

pub struct StaticSiteBuilder {
    owner: String,
}

impl StaticSiteBuilder {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
        }
    }

    fn license(&self, year: i32) -> String {
        MIT_TEMPLATE
            .replace("{year}", &year.to_string())
            .replace("{owner}", &self.owner)
    }
}

impl ArtifactBuilder for StaticSiteBuilder {
    fn build(&self, brief: &str, attachments: &[Attachment], year: i32) -> FileMap {
        let default_asset = attachments.first().map(|a| a.name.as_str()).unwrap_or("");
        // a JSON string literal is also a valid, escaped JS string literal
        let default_asset =
            serde_json::to_string(default_asset).unwrap_or_else(|_| "\"\"".to_string());

        let readme = format!(
            "# Auto-generated Task App\n\n**Brief:** {brief}\n\n\
             Usage: open `index.html` or deploy to Pages and use the `?url=` parameter.\n"
        );

        let mut files = FileMap::new();
        files.insert(
            INDEX_FILE.to_string(),
            INDEX_TEMPLATE.replace("{default_asset}", &default_asset),
        );
        files.insert(README_FILE.to_string(), readme);
        files.insert(LICENSE_FILE.to_string(), self.license(year));
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_page_readme_and_license() {
        let builder = StaticSiteBuilder::new("octo");
        let files = builder.build("solve captchas", &[], 2025);

        let names: Vec<_> = files.keys().map(String::as_str).collect();
        assert_eq!(names, vec![LICENSE_FILE, README_FILE, INDEX_FILE]);
        assert!(files[README_FILE].contains("**Brief:** solve captchas"));
    }

    #[test]
    fn license_is_templated_with_year_and_owner() {
        let builder = StaticSiteBuilder::new("Octo Cat");
        let files = builder.build("", &[], 2031);

        assert!(files[LICENSE_FILE].starts_with("MIT License\n\nCopyright (c) 2031 Octo Cat\n"));
    }

    #[test]
    fn page_defaults_to_first_attachment() {
        let builder = StaticSiteBuilder::new("octo");
        let attachments = vec![
            Attachment::new("sample.png", "data:image/png;base64,AA=="),
            Attachment::new("other.png", "data:image/png;base64,AA=="),
        ];
        let files = builder.build("", &attachments, 2025);

        assert!(files[INDEX_FILE].contains(r#"params.get('url') || "sample.png";"#));
        assert!(!files[INDEX_FILE].contains("other.png"));
    }

    #[test]
    fn build_is_deterministic() {
        let builder = StaticSiteBuilder::new("octo");
        let attachments = vec![Attachment::new("a.svg", "data:image/svg+xml;base64,AA==")];

        assert_eq!(
            builder.build("brief", &attachments, 2025),
            builder.build("brief", &attachments, 2025)
        );
    }
}
