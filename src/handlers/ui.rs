// src/handlers/ui.rs
use axum::{response::Html, routing::get, Router};

pub fn ui_routes() -> Router {
    Router::new().route("/", get(dashboard))
}

/// The single-page dashboard: chart panel and upload area on the left,
/// conversation panel and description input on the right. All interaction
/// goes through the JSON endpoints; the page itself is static.
pub async fn dashboard() -> Html<String> {
    let html = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>SheetInsight</title>
    <script src="https://cdn.plot.ly/plotly-2.35.2.min.js"></script>
    <style>
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 0; padding: 20px; background: #f5f6f8; }
        h1 { margin: 0 0 15px 0; }
        .row { display: flex; gap: 20px; align-items: flex-start; }
        .col-left { flex: 7; min-width: 0; }
        .col-right { flex: 5; min-width: 0; }
        .card { background: white; border: 1px solid #dee2e6; border-radius: 8px; margin-bottom: 20px; }
        .card-header { padding: 12px 16px; border-bottom: 1px solid #dee2e6; font-weight: 600; }
        .card-body { padding: 16px; }
        #output-graph { height: 425px; }
        #conversation { height: 560px; overflow: auto; }
        .exchange { margin-bottom: 14px; }
        .exchange .description { margin-bottom: 4px; }
        .exchange code { display: block; background: #f1f3f5; padding: 8px; border-radius: 5px; white-space: pre-wrap; word-break: break-all; }
        .notice { color: #c0392b; margin-bottom: 14px; }
        .upload-area { border: 2px dashed #ccc; border-radius: 8px; padding: 30px; text-align: center; cursor: pointer; }
        .upload-area.dragging { border-color: #007bff; background: #f8f9fa; }
        #upload-output { overflow: auto; max-height: 340px; margin-top: 12px; }
        table.preview { border-collapse: collapse; font-size: 13px; width: 100%; }
        table.preview th, table.preview td { border: 1px solid #dee2e6; padding: 4px 8px; text-align: left; white-space: nowrap; }
        table.preview th { background: #f8f9fa; }
        .input-group { display: flex; gap: 8px; }
        .input-group input { flex: 1; padding: 10px; border: 1px solid #ced4da; border-radius: 5px; }
        .input-group button { background: #007bff; color: white; border: none; border-radius: 5px; padding: 10px 20px; cursor: pointer; }
        .input-group button:hover { background: #0056b3; }
        .input-group button:disabled { background: #8daed0; cursor: wait; }
        .muted { color: #6c757d; font-size: 13px; }
    </style>
</head>
<body>
    <h1>📊 SheetInsight</h1>
    <div class="row">
        <div class="col-left">
            <div class="card">
                <div class="card-header">AI Generated Insight</div>
                <div class="card-body"><div id="output-graph"></div></div>
            </div>
            <div class="card">
                <div class="card-header">Upload Your Spreadsheet File</div>
                <div class="card-body">
                    <div class="upload-area" id="upload-area">
                        📁 Drag and drop or click to select (.csv, .xls, .xlsx)
                        <input type="file" id="file-input" multiple accept=".csv,.xls,.xlsx" style="display: none;">
                    </div>
                    <div id="upload-output"></div>
                </div>
            </div>
        </div>
        <div class="col-right">
            <div class="card">
                <div class="card-header">Chat Interface</div>
                <div class="card-body"><div id="conversation"></div></div>
            </div>
            <div class="input-group">
                <input id="input-text" placeholder="What do you want to see about your data?">
                <button id="button-submit">Submit</button>
            </div>
        </div>
    </div>

    <script>
        const sessionId = crypto.randomUUID();
        const uploadArea = document.getElementById('upload-area');
        const fileInput = document.getElementById('file-input');
        const uploadOutput = document.getElementById('upload-output');
        const conversation = document.getElementById('conversation');
        const inputText = document.getElementById('input-text');
        const submitButton = document.getElementById('button-submit');

        function renderFigure(figure) {
            const layout = figure.layout || {};
            // The template name is applied server-side in spirit; plotly.js
            // wants explicit colors instead of a named template.
            delete layout.template;
            layout.paper_bgcolor = 'white';
            layout.plot_bgcolor = 'white';
            Plotly.newPlot('output-graph', figure.data || [], layout, { responsive: true, displaylogo: false });
        }

        function previewTable(columns, rows) {
            const head = columns.map(c => '<th>' + escapeHtml(c) + '</th>').join('');
            const body = rows.map(r => '<tr>' + r.map(v => '<td>' + escapeHtml(v) + '</td>').join('') + '</tr>').join('');
            return '<table class="preview"><thead><tr>' + head + '</tr></thead><tbody>' + body + '</tbody></table>';
        }

        function escapeHtml(value) {
            const div = document.createElement('div');
            div.textContent = String(value);
            return div.innerHTML;
        }

        function showSummary(summary, sample) {
            const heading = sample
                ? '<h3>Example Data: Gapminder</h3><p class="muted">Upload a spreadsheet to chart your own data.</p>'
                : '<h3>' + escapeHtml(summary.filename) + '</h3><p class="muted">' + escapeHtml(summary.uploaded_at)
                    + ' — ' + summary.row_count + ' rows</p>';
            uploadOutput.innerHTML = heading + previewTable(summary.columns, summary.preview);
        }

        async function loadActiveTable() {
            const response = await fetch('/api/session/' + sessionId + '/table');
            const data = await response.json();
            showSummary(data.summary, data.sample);
        }

        async function uploadFiles(files) {
            const formData = new FormData();
            for (const file of files) {
                formData.append('files', file);
            }
            const response = await fetch('/upload/session/' + sessionId, { method: 'POST', body: formData });
            const result = await response.json();
            const notices = result.files.filter(f => !f.success).map(f =>
                '<p class="notice">' + escapeHtml(f.filename) + ': ' + escapeHtml(f.notice) + '</p>').join('');
            await loadActiveTable();
            if (notices) {
                uploadOutput.insertAdjacentHTML('afterbegin', notices);
            }
        }

        function renderTranscript(entries, error) {
            conversation.innerHTML = '';
            for (const entry of entries) {
                const block = document.createElement('div');
                block.className = 'exchange';
                block.innerHTML = '<div class="description"><strong>Description</strong>: '
                    + escapeHtml(entry.description) + '</div><code>' + escapeHtml(entry.code) + '</code>';
                conversation.appendChild(block);
            }
            if (error) {
                const block = document.createElement('div');
                block.className = 'notice';
                block.textContent = error;
                conversation.appendChild(block);
            }
            conversation.scrollTop = conversation.scrollHeight;
        }

        async function submitDescription() {
            const description = inputText.value.trim();
            if (!description) return;
            submitButton.disabled = true;
            try {
                const response = await fetch('/api/insight/session/' + sessionId, {
                    method: 'POST',
                    headers: { 'content-type': 'application/json' },
                    body: JSON.stringify({ description })
                });
                const result = await response.json();
                renderFigure(result.figure);
                renderTranscript(result.transcript, result.error);
                inputText.value = '';
            } catch (error) {
                renderTranscript([], 'Request failed: ' + error.message);
            } finally {
                submitButton.disabled = false;
                inputText.focus();
            }
        }

        uploadArea.addEventListener('click', () => fileInput.click());
        uploadArea.addEventListener('dragover', e => { e.preventDefault(); uploadArea.classList.add('dragging'); });
        uploadArea.addEventListener('dragleave', () => uploadArea.classList.remove('dragging'));
        uploadArea.addEventListener('drop', e => {
            e.preventDefault();
            uploadArea.classList.remove('dragging');
            uploadFiles(e.dataTransfer.files);
        });
        fileInput.addEventListener('change', e => uploadFiles(e.target.files));
        submitButton.addEventListener('click', submitDescription);
        inputText.addEventListener('keydown', e => { if (e.key === 'Enter') submitDescription(); });

        renderFigure({
            data: [],
            layout: {
                title: 'Please tell me what you want to see about your data',
                margin: { l: 0, r: 0, t: 30, b: 0 }
            }
        });
        loadActiveTable();
    </script>
</body>
</html>
"##;

    Html(html.to_string())
}
