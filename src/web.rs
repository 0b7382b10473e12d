use std::sync::Arc;

use colored::*;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::error::ViewError;
use crate::pipeline::Pipeline;

/// Largest request body accepted by `/api/analyze`.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Embedded single-page dashboard. Charts are drawn on plain canvases, no CDN.
pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Empathy Engine</title>
<style>
*{margin:0;padding:0;box-sizing:border-box}
body{background:#0d1117;color:#c9d1d9;font-family:system-ui,sans-serif;min-height:100vh}
header{padding:16px 24px;border-bottom:1px solid #21262d}
header h1{font-size:1.2rem;color:#58a6ff}
.controls{padding:16px 24px;display:flex;flex-direction:column;gap:10px;border-bottom:1px solid #21262d;background:#161b22}
.controls label{font-size:.7rem;color:#8b949e;text-transform:uppercase;letter-spacing:.5px}
textarea{background:#0d1117;border:1px solid #30363d;color:#c9d1d9;padding:8px 10px;border-radius:6px;font-family:inherit;font-size:.9rem;min-height:140px;resize:vertical}
textarea:focus{outline:none;border-color:#58a6ff}
.btn{align-self:flex-start;border:none;padding:7px 18px;border-radius:6px;font-size:.9rem;cursor:pointer;color:#fff;background:#238636}
.btn:hover{background:#2ea043}
.btn:disabled{background:#21262d;color:#484f58;cursor:not-allowed}
main{padding:16px 24px;display:grid;gap:16px}
.card{background:#161b22;border:1px solid #21262d;border-radius:8px;padding:12px 16px}
.card h2{font-size:.7rem;color:#8b949e;text-transform:uppercase;letter-spacing:.5px;margin-bottom:8px}
.hidden{display:none}
#trend{line-height:1.6}
#summary{color:#8b949e;font-size:.85rem;margin-top:6px}
.tag{display:inline-block;padding:3px 10px;border-radius:12px;margin:2px 4px;color:#0d1117;font-size:.85rem;font-weight:600}
#breakdown{padding-left:24px}
#breakdown li{margin:4px 0}
.emotion{font-weight:bold;margin-left:8px}
.charts{display:grid;grid-template-columns:repeat(auto-fit,minmax(320px,1fr));gap:16px}
canvas{width:100%;height:240px;display:block}
</style>
</head>
<body>
<header><h1>Empathy Engine</h1></header>
<div class="controls">
  <label for="chat">Chat messages (one per line)</label>
  <textarea id="chat" placeholder="I am happy&#10;I am sad"></textarea>
  <button class="btn" id="analyze">Analyze</button>
</div>
<main>
  <div class="card hidden" id="trend-card"><h2>Emotional Trend</h2><div id="trend"></div><div id="summary"></div></div>
  <div class="card hidden" id="tags-card"><h2>Emotions</h2><div id="tags"></div></div>
  <div class="card hidden" id="breakdown-card"><h2>Message Breakdown</h2><ol id="breakdown"></ol></div>
  <div class="charts hidden" id="charts">
    <div class="card"><h2>Intensity</h2><canvas id="line-chart"></canvas></div>
    <div class="card"><h2>Distribution</h2><canvas id="pie-chart"></canvas></div>
    <div class="card"><h2>Counts</h2><canvas id="bar-chart"></canvas></div>
  </div>
</main>
<script>
const $=id=>document.getElementById(id);
const SECTIONS=['trend-card','tags-card','breakdown-card','charts'];
let pending=false;

function prepCanvas(c){
  const dpr=window.devicePixelRatio||1;
  const w=c.clientWidth,h=c.clientHeight;
  c.width=w*dpr;c.height=h*dpr;
  const ctx=c.getContext('2d');
  ctx.setTransform(dpr,0,0,dpr,0,0);
  ctx.clearRect(0,0,w,h);
  return {ctx,w,h};
}

function controlPoints(pts,t){
  return pts.map((cur,i)=>{
    const prev=pts[i-1]||cur,next=pts[i+1]||cur;
    const d01=Math.hypot(cur.x-prev.x,cur.y-prev.y),d12=Math.hypot(next.x-cur.x,next.y-cur.y);
    const sum=d01+d12,s01=sum>0?d01/sum:0,s12=sum>0?d12/sum:0;
    const dx=next.x-prev.x,dy=next.y-prev.y;
    return {before:{x:cur.x-t*s01*dx,y:cur.y-t*s01*dy},after:{x:cur.x+t*s12*dx,y:cur.y+t*s12*dy}};
  });
}

function drawLine(chart){
  const {ctx,w,h}=prepCanvas($('line-chart'));
  const pl=36,pr=12,pt=12,pb=28,pw=w-pl-pr,ph=h-pt-pb;
  const n=chart.values.length;
  const yOf=v=>pt+ph-(Math.min(Math.max(v,chart.y_min),chart.y_max)-chart.y_min)/(chart.y_max-chart.y_min)*ph;
  const xOf=i=>n<=1?pl+pw/2:pl+pw*i/(n-1);
  ctx.font='10px system-ui';ctx.fillStyle='#8b949e';ctx.strokeStyle='#21262d';
  for(let s=0;s<=4;s++){
    const v=chart.y_min+(chart.y_max-chart.y_min)*s/4,y=yOf(v);
    ctx.beginPath();ctx.moveTo(pl,y);ctx.lineTo(w-pr,y);ctx.stroke();
    ctx.textAlign='right';ctx.fillText(v.toFixed(2),pl-4,y+3);
  }
  const pts=chart.values.map((v,i)=>({x:xOf(i),y:yOf(v)}));
  if(pts.length>1){
    const cps=controlPoints(pts,chart.tension);
    ctx.beginPath();ctx.moveTo(pts[0].x,pts[0].y);
    for(let i=1;i<pts.length;i++){
      ctx.bezierCurveTo(cps[i-1].after.x,cps[i-1].after.y,cps[i].before.x,cps[i].before.y,pts[i].x,pts[i].y);
    }
    ctx.strokeStyle='#5c6bc0';ctx.lineWidth=2;ctx.stroke();ctx.lineWidth=1;
  }
  pts.forEach((p,i)=>{
    ctx.beginPath();ctx.arc(p.x,p.y,4,0,Math.PI*2);ctx.fillStyle=chart.point_colors[i];ctx.fill();
    ctx.fillStyle='#8b949e';ctx.textAlign='center';ctx.fillText(chart.labels[i],p.x,h-10);
  });
}

function drawPie(chart){
  const {ctx,w,h}=prepCanvas($('pie-chart'));
  const total=chart.slices.reduce((a,s)=>a+s.value,0);
  if(total===0)return;
  const cx=w/2,cy=h/2,r=Math.min(w,h)/2-12;
  let a=-Math.PI/2;
  chart.slices.forEach(s=>{
    if(s.value<=0)return;
    const sweep=s.value/total*Math.PI*2;
    ctx.beginPath();ctx.moveTo(cx,cy);ctx.arc(cx,cy,r,a,a+sweep);ctx.closePath();
    ctx.fillStyle=s.color;ctx.fill();ctx.strokeStyle='#0d1117';ctx.stroke();
    a+=sweep;
  });
}

function drawBar(chart){
  const {ctx,w,h}=prepCanvas($('bar-chart'));
  const pl=36,pr=12,pt=12,pb=28,pw=w-pl-pr,ph=h-pt-pb;
  const max=Math.max(1,...chart.bars.map(b=>b.value));
  const slot=pw/Math.max(1,chart.bars.length),bw=slot*0.6;
  const ticks=Math.min(max,5);
  ctx.font='10px system-ui';ctx.strokeStyle='#21262d';
  for(let s=0;s<=ticks;s++){
    const v=max*s/ticks,y=pt+ph-v/max*ph;
    ctx.beginPath();ctx.moveTo(pl,y);ctx.lineTo(w-pr,y);ctx.stroke();
    ctx.fillStyle='#8b949e';ctx.textAlign='right';ctx.fillText(Math.round(v),pl-4,y+3);
  }
  chart.bars.forEach((b,i)=>{
    const bh=b.value/max*ph,x=pl+slot*i+(slot-bw)/2;
    ctx.fillStyle=b.color;ctx.fillRect(x,pt+ph-bh,bw,bh);
    ctx.fillStyle='#8b949e';ctx.textAlign='center';ctx.fillText(b.label,x+bw/2,h-10);
  });
}

function reset(){
  $('trend').innerHTML='';$('summary').textContent='';
  $('tags').replaceChildren();$('breakdown').replaceChildren();
  ['line-chart','pie-chart','bar-chart'].forEach(id=>prepCanvas($(id)));
}

function render(d){
  reset();
  SECTIONS.forEach(id=>$(id).classList.remove('hidden'));
  $('trend').innerHTML=d.trend;
  if(d.summary)$('summary').textContent=d.summary;
  d.tags.forEach(t=>{
    const s=document.createElement('span');
    s.className='tag';s.style.background=t.color;s.textContent=t.label;
    $('tags').appendChild(s);
  });
  d.breakdown.forEach(b=>{
    const li=document.createElement('li');li.value=b.index;
    const text=document.createElement('span');text.textContent=b.text;
    const em=document.createElement('span');em.className='emotion';em.style.color=b.color;em.textContent=b.emotion;
    li.append(text,em);$('breakdown').appendChild(li);
  });
  drawLine(d.line);drawPie(d.pie);drawBar(d.bar);
}

$('analyze').addEventListener('click',async()=>{
  if(pending)return;
  pending=true;$('analyze').disabled=true;
  try{
    let resp;
    try{
      resp=await fetch('/api/analyze',{method:'POST',headers:{'Content-Type':'application/json'},body:JSON.stringify({text:$('chat').value})});
    }catch(e){
      alert('Connection error: could not reach the dashboard server.');
      return;
    }
    const body=await resp.json().catch(()=>null);
    if(!resp.ok||!body){
      alert(body&&body.message?body.message:'Analysis failed (HTTP '+resp.status+').');
      return;
    }
    render(body);
  }finally{
    pending=false;$('analyze').disabled=false;
  }
});
</script>
</body>
</html>"##;

/// JSON body of `POST /api/analyze`.
#[derive(Debug, Deserialize)]
pub struct AnalyzeForm {
    pub text: String,
}

#[derive(Debug, Serialize)]
struct ErrorReply {
    error: &'static str,
    message: String,
    detail: String,
}

/// Request line and framing pulled out of the header block.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestHead {
    pub method: String,
    pub path: String,
    pub content_length: usize,
    /// Bytes taken by the request line and headers, including the blank line.
    pub header_len: usize,
}

/// Parse the header block; `Ok(None)` means more bytes are needed.
pub fn parse_head(buf: &[u8]) -> Result<Option<RequestHead>, String> {
    let mut headers = [httparse::EMPTY_HEADER; 32];
    let mut req = httparse::Request::new(&mut headers);
    let header_len = match req.parse(buf).map_err(|e| e.to_string())? {
        httparse::Status::Complete(n) => n,
        httparse::Status::Partial => return Ok(None),
    };

    let content_length = req
        .headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case("content-length"))
        .map(|h| {
            std::str::from_utf8(h.value)
                .ok()
                .and_then(|v| v.trim().parse::<usize>().ok())
                .ok_or_else(|| "invalid Content-Length".to_string())
        })
        .transpose()?
        .unwrap_or(0);

    let path = req.path.unwrap_or("/");
    let path = path.split('?').next().unwrap_or("/").to_string();

    Ok(Some(RequestHead {
        method: req.method.unwrap_or("GET").to_string(),
        path,
        content_length,
        header_len,
    }))
}

/// HTTP status and reason for a failed run.
pub fn status_for(err: &ViewError) -> (u16, &'static str) {
    match err {
        ViewError::Busy => (409, "Conflict"),
        ViewError::Transport { .. } | ViewError::Backend { .. } | ViewError::Malformed(_) => {
            (502, "Bad Gateway")
        }
        ViewError::Config(_) | ViewError::Io(_) => (500, "Internal Server Error"),
    }
}

fn response(status: u16, reason: &str, content_type: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len(),
    )
}

fn json_response<T: Serialize>(status: u16, reason: &str, value: &T) -> String {
    match serde_json::to_string(value) {
        Ok(body) => response(status, reason, "application/json", &body),
        Err(e) => response(500, "Internal Server Error", "text/plain", &e.to_string()),
    }
}

fn error_response(err: &ViewError) -> String {
    let (status, reason) = status_for(err);
    json_response(
        status,
        reason,
        &ErrorReply {
            error: err.kind(),
            message: err.user_notice(),
            detail: err.to_string(),
        },
    )
}

/// Start the web UI server on localhost and open the browser.
pub async fn serve(port: u16, pipeline: Arc<Pipeline>, open_browser: bool) -> Result<(), ViewError> {
    let listener = TcpListener::bind(format!("127.0.0.1:{}", port)).await?;

    eprintln!(
        "{}",
        format!("  Web UI running at http://localhost:{}", port).bright_green()
    );
    eprintln!(
        "{}",
        format!("  Analysis backend: {}", pipeline.client().endpoint()).bright_blue()
    );
    eprintln!("{}", "  Press Ctrl+C to stop.".bright_blue());

    if open_browser {
        #[cfg(target_os = "windows")]
        {
            let _ = std::process::Command::new("cmd")
                .args(["/C", &format!("start http://localhost:{}", port)])
                .spawn();
        }
        #[cfg(target_os = "macos")]
        {
            let _ = std::process::Command::new("open")
                .arg(format!("http://localhost:{}", port))
                .spawn();
        }
        #[cfg(target_os = "linux")]
        {
            let _ = std::process::Command::new("xdg-open")
                .arg(format!("http://localhost:{}", port))
                .spawn();
        }
    }

    serve_on(listener, pipeline).await
}

/// Accept loop on an already bound listener.
pub async fn serve_on(listener: TcpListener, pipeline: Arc<Pipeline>) -> Result<(), ViewError> {
    info!(addr = ?listener.local_addr().ok(), "web UI listening");
    loop {
        let (stream, addr) = listener.accept().await?;
        let pipeline = Arc::clone(&pipeline);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, pipeline).await {
                warn!(%addr, error = %e, "connection error");
            }
        });
    }
}

async fn handle_connection(mut stream: TcpStream, pipeline: Arc<Pipeline>) -> Result<(), ViewError> {
    let mut buf = Vec::with_capacity(8192);
    let mut chunk = [0u8; 8192];

    let head = loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
        match parse_head(&buf) {
            Ok(Some(head)) => break head,
            Ok(None) if buf.len() < 64 * 1024 => continue,
            Ok(None) => {
                let resp = response(431, "Request Header Fields Too Large", "text/plain", "headers too large");
                stream.write_all(resp.as_bytes()).await?;
                return Ok(());
            }
            Err(e) => {
                let resp = response(400, "Bad Request", "text/plain", &e);
                stream.write_all(resp.as_bytes()).await?;
                return Ok(());
            }
        }
    };

    if head.content_length > MAX_BODY_BYTES {
        let resp = response(413, "Payload Too Large", "text/plain", "request body too large");
        stream.write_all(resp.as_bytes()).await?;
        return Ok(());
    }

    let total = head.header_len + head.content_length;
    while buf.len() < total {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body = &buf[head.header_len.min(buf.len())..total.min(buf.len())];
    debug!(method = %head.method, path = %head.path, body_len = body.len(), "request");

    let resp = match (head.method.as_str(), head.path.as_str()) {
        ("GET", "/") => response(200, "OK", "text/html; charset=utf-8", INDEX_HTML),
        ("GET", "/api/palette") => json_response(200, "OK", pipeline.palette()),
        ("GET", "/api/health") => match pipeline.client().health().await {
            Ok(h) => json_response(200, "OK", &h),
            Err(e) => error_response(&e),
        },
        ("POST", "/api/analyze") => match serde_json::from_slice::<AnalyzeForm>(body) {
            Ok(form) => match pipeline.analyze(&form.text).await {
                Ok(dashboard) => json_response(200, "OK", &dashboard),
                Err(e) => error_response(&e),
            },
            Err(e) => json_response(
                400,
                "Bad Request",
                &ErrorReply {
                    error: "request",
                    message: "Request body must be {\"text\": \"...\"}.".to_string(),
                    detail: e.to_string(),
                },
            ),
        },
        (_, "/") | (_, "/api/palette") | (_, "/api/health") | (_, "/api/analyze") => {
            response(405, "Method Not Allowed", "text/plain", "Method Not Allowed")
        }
        _ => response(404, "Not Found", "text/plain", "Not Found"),
    };

    stream.write_all(resp.as_bytes()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- parse_head tests --

    #[test]
    fn test_parse_head_get() {
        let head = parse_head(b"GET /api/palette?x=1 HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .expect("parse")
            .expect("complete");
        assert_eq!(head.method, "GET");
        assert_eq!(head.path, "/api/palette");
        assert_eq!(head.content_length, 0);
    }

    #[test]
    fn test_parse_head_post_with_length() {
        let raw = b"POST /api/analyze HTTP/1.1\r\nContent-Type: application/json\r\ncontent-length: 13\r\n\r\n{\"text\":\"a\"}";
        let head = parse_head(raw).expect("parse").expect("complete");
        assert_eq!(head.method, "POST");
        assert_eq!(head.content_length, 13);
        assert_eq!(&raw[head.header_len..], b"{\"text\":\"a\"}");
    }

    #[test]
    fn test_parse_head_partial() {
        assert_eq!(parse_head(b"GET / HTTP/1.1\r\nHost: loc").expect("parse"), None);
    }

    #[test]
    fn test_parse_head_bad_length() {
        assert!(parse_head(b"POST / HTTP/1.1\r\nContent-Length: lots\r\n\r\n").is_err());
    }

    #[test]
    fn test_parse_head_garbage() {
        assert!(parse_head(b"\x00\x01\x02 nonsense\r\n\r\n").is_err());
    }

    // -- status mapping --

    #[test]
    fn test_status_for_errors() {
        assert_eq!(status_for(&ViewError::Busy).0, 409);
        assert_eq!(
            status_for(&ViewError::Transport { url: "u".into(), detail: "d".into() }).0,
            502
        );
        assert_eq!(status_for(&ViewError::Backend { status: 500, detail: "d".into() }).0, 502);
        assert_eq!(status_for(&ViewError::Malformed("m".into())).0, 502);
        assert_eq!(status_for(&ViewError::Config("c".into())).0, 500);
    }

    #[test]
    fn test_response_content_length() {
        let r = response(200, "OK", "text/plain", "héllo");
        assert!(r.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(r.contains("Content-Length: 6\r\n"));
        assert!(r.ends_with("\r\n\r\nhéllo"));
    }

    #[test]
    fn test_error_response_body() {
        let r = error_response(&ViewError::Busy);
        assert!(r.starts_with("HTTP/1.1 409 Conflict"));
        assert!(r.contains("\"error\":\"busy\""));
    }

    // -- INDEX_HTML structure tests --

    #[test]
    fn test_index_html_is_valid_html() {
        assert!(INDEX_HTML.starts_with("<!DOCTYPE html>"));
        assert!(INDEX_HTML.contains("</html>"));
    }

    #[test]
    fn test_index_html_has_surfaces() {
        for id in ["id=\"chat\"", "id=\"analyze\"", "id=\"trend\"", "id=\"tags\"", "id=\"breakdown\"",
                   "id=\"line-chart\"", "id=\"pie-chart\"", "id=\"bar-chart\""] {
            assert!(INDEX_HTML.contains(id), "missing {id}");
        }
    }

    #[test]
    fn test_index_html_result_sections_start_hidden() {
        assert!(INDEX_HTML.contains("class=\"card hidden\" id=\"trend-card\""));
        assert!(INDEX_HTML.contains("class=\"charts hidden\" id=\"charts\""));
    }

    #[test]
    fn test_index_html_guards_pending_request() {
        assert!(INDEX_HTML.contains("disabled=true"));
        assert!(INDEX_HTML.contains("if(pending)return"));
    }

    #[test]
    fn test_index_html_has_bezier_curves() {
        assert!(INDEX_HTML.contains("bezierCurveTo"));
    }

    #[test]
    fn test_index_html_no_external_deps() {
        assert!(!INDEX_HTML.contains("cdn."));
        assert!(!INDEX_HTML.contains("unpkg.com"));
        assert!(!INDEX_HTML.contains("jsdelivr"));
    }

    #[tokio::test]
    async fn test_serve_binds_to_port() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await;
        assert!(listener.is_ok());
        let addr = listener.unwrap().local_addr().unwrap();
        assert!(addr.port() > 0);
    }
}
