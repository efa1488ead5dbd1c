//! Content trees shared by the unit tests.

use std::fs;
use std::path::Path;

pub const MARKDOWN_TEST: &str = r#"---
title: マークダウンテスト用ページ
createdAt: '2099-01-01'
updatedAt: '2099-01-01'
tags: ['テスト', 'マークダウン']
published: true
isTest: true
---

このページはマークダウンテストのために作成された特別なページです。一般ユーザーには表示されません。

# 見出しレベル1

## 見出しレベル2

### 見出しレベル3

#### 見出しレベル4

##### 見出しレベル5

###### 見出しレベル6

## テキストのスタイル設定

**これは太字テキストです**

_これは斜体テキストです_

~~これは取り消し線テキストです~~

`インラインコード`

[リンクテキスト](https://example.com)

![代替テキスト](/images/sample.png)

<div>HTMLブロック</div>
"#;

pub const MARKDOWN_TEST_DESCRIPTION: &str = "このページはマークダウンテストのために作成された特別なページです。一般ユーザーには表示されません。 見出しレベル1 見出しレベル2 見出しレベル3 見出しレベル4 見出しレベル5 見出しレベル6 テキストのスタイル設定 **これは太字テキストです** _これは斜体テキストです_ ~~これは取り消し線テキストです~~...";

const CUSTOM_COMPONENT_TEST: &str = r#"---
title: カスタムコンポーネントテスト用ページ
createdAt: '2099-01-02'
tags: ['テスト', 'コンポーネント']
published: true
isTest: true
---

<LinkCard url="https://example.com" />
"#;

const TAG_TEST: &str = r#"---
title: タグテスト用ページ
createdAt: '2099-01-03'
tags: ['テスト', 'タグ機能', 'プログラミング']
published: true
isTest: true
---

タグ機能を確認するためのページです。
"#;

const HELLO_WORLD: &str = r#"---
title: Hello, world
createdAt: 2024-05-10
tags: [Rust, ブログ]
published: true
---

First post on the new blog.
"#;

const DRAFT: &str = r#"---
title: Unfinished thoughts
createdAt: '2024-06-01'
tags: [Rust]
published: false
---

Not ready yet.
"#;

const YEAR_END: &str = r#"---
title: 一年の振り返り
createdAt: '2023-12-31T21:00:00+09:00'
updatedAt: '2024-01-02'
tags: [振り返り]
published: true
description: 今年やったことのまとめ
---

長い本文。
"#;

/// Write a single file below `root`, creating directories.
pub fn write_post(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// Six posts: three published test posts, two published regular posts and
/// one unpublished draft.
pub fn write_fixture_tree(root: &Path) {
    write_post(root, "2099/01/01_markdown-test.mdx", MARKDOWN_TEST);
    write_post(root, "2099/01/02_custom-component-test.mdx", CUSTOM_COMPONENT_TEST);
    write_post(root, "2099/01/03_tag-test.mdx", TAG_TEST);
    write_post(root, "2024/05/10_hello-world.md", HELLO_WORLD);
    write_post(root, "2024/06/draft.mdx", DRAFT);
    write_post(root, "2023/12/year-end.mdx", YEAR_END);
}
