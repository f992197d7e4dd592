/// Input form served at `/`.
pub const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <title>AI Content-to-PDF Enhancer</title>
  <style>
    body { font-family: Arial, sans-serif; margin: 40px; background: #f9f9f9; }
    form { background: #fff; padding: 20px; border-radius: 10px; width: 400px; }
    textarea, input { width: 100%; margin-bottom: 10px; padding: 8px; box-sizing: border-box; }
    button {
      padding: 8px 12px; background: #0078d7; color: #fff;
      border: none; border-radius: 5px; cursor: pointer;
    }
    button:hover { background: #005bb5; }
  </style>
</head>
<body>
  <h1>AI Content-to-PDF Enhancer</h1>
  <form action="/process" method="post">
    <label for="text">Enter Text:</label>
    <textarea id="text" name="text" rows="5"></textarea>
    <label for="url">Or Enter URL:</label>
    <input id="url" type="text" name="url" placeholder="https://example.com">
    <button type="submit">Generate PDF</button>
  </form>
</body>
</html>
"#;
