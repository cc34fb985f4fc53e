//! Standalone Leaflet page for a [`MapView`]

use super::MapView;
use crate::{GuideError, Result};

const PAGE_TEMPLATE: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>__TITLE__</title>
  <link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css" />
  <script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
  <style>
    html, body { height: 100%; margin: 0; font-family: system-ui, sans-serif; }
    #map { position: absolute; inset: 0; }
    .warnings { position: absolute; top: 8px; left: 50px; z-index: 1000; background: #fff3cd;
      border: 1px solid #e0c46c; padding: 4px 8px; border-radius: 4px; font-size: 13px; }
    .warnings:empty { display: none; }
    .legend { background: #fff; padding: 6px 8px; border-radius: 4px; line-height: 18px; font-size: 12px; }
    .legend i { width: 14px; height: 14px; float: left; margin-right: 6px; opacity: 0.8; }
    .stop-icon { border-radius: 50%; color: #fff; font-weight: 700; text-align: center;
      line-height: 24px; width: 24px; height: 24px; border: 2px solid #fff; box-shadow: 0 0 4px #333; }
  </style>
</head>
<body>
  <div id="map"></div>
  <div id="warnings" class="warnings"></div>
  <script id="view-data" type="application/json">__VIEW__</script>
  <script>
    const view = JSON.parse(document.getElementById('view-data').textContent);
__SCRIPT__
  </script>
</body>
</html>
"#;

const SCRIPT: &str = r#"
    const esc = (s) => String(s).replace(/[&<>"']/g, (c) => ({'&':'&amp;','<':'&lt;','>':'&gt;','"':'&quot;',"'":'&#39;'}[c]));
    const map = L.map('map').setView(view.center, view.zoom);
    L.tileLayer('https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png', {
      maxZoom: 19, attribution: '&copy; OpenStreetMap contributors'
    }).addTo(map);
    const overlays = {};

    if (view.choropleth) {
      const c = view.choropleth;
      overlays[c.name] = L.geoJSON(c.features, {
        style: (f) => ({
          fillColor: f.properties.fill_color, fillOpacity: c.fill_opacity,
          color: '#000', weight: 1, opacity: c.line_opacity
        }),
        onEachFeature: (f, layer) => {
          const total = f.properties.total_incidents;
          layer.bindTooltip(esc(f.properties.name || '') + ': ' + (total === null ? 'no data' : total));
        }
      }).addTo(map);
      const legend = L.control({ position: 'bottomright' });
      legend.onAdd = () => {
        const div = L.DomUtil.create('div', 'legend');
        div.innerHTML = '<b>' + esc(c.name) + '</b><br>' + c.legend.map((b) =>
          '<i style="background:' + b.color + '"></i>' + Math.round(b.lower) + ' - ' + Math.round(b.upper)
        ).join('<br>');
        return div;
      };
      legend.addTo(map);
    }

    for (const layer of view.marker_layers) {
      const group = L.layerGroup(layer.markers.map((m) =>
        L.circleMarker([m.lat, m.lng], {
          radius: layer.style.radius, color: layer.style.color, fill: layer.style.fill
        }).bindPopup('<b>' + esc(m.label) + '</b>' + (m.detail ? '<br>' + esc(m.detail) : ''))
      ));
      overlays[layer.name] = group.addTo(map);
    }

    if (view.route) {
      const r = view.route;
      const group = L.layerGroup();
      L.polyline(r.path, { color: r.color, weight: r.weight, opacity: r.opacity }).addTo(group);
      for (const s of r.stops) {
        const icon = L.divIcon({
          className: '', iconSize: [28, 28],
          html: '<div class="stop-icon" style="background:' + s.color + '">' + s.ordinal + '</div>'
        });
        L.marker([s.lat, s.lng], { icon: icon, title: s.label })
          .bindTooltip(esc(s.label)).addTo(group);
      }
      overlays['Route'] = group.addTo(map);
    }

    L.control.layers(null, overlays, { collapsed: false }).addTo(map);
    document.getElementById('warnings').textContent = view.warnings.join(' | ');
"#;

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render an interactive page showing `view`
pub fn render_html(title: &str, view: &MapView) -> Result<String> {
    let data = serde_json::to_string(view)
        .map_err(|e| GuideError::parse(format!("Failed to encode map view: {e}")))?
        // keep the payload inside its script element
        .replace("</", "<\\/");

    // The payload goes in last so its text is never scanned for placeholders
    Ok(PAGE_TEMPLATE
        .replace("__SCRIPT__", SCRIPT)
        .replace("__TITLE__", &escape_html(title))
        .replace("__VIEW__", &data))
}
