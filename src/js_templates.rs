pub const BINDING_PLACEHOLDER: &str = "__BINDING__";

/// Injected into every document of the recording page. Posts one
/// `{action, timestamp, target}` message per click through the CDP binding.
const RECORDER_SCRIPT: &str = r#"(function(){if(window.__testpilotInstalled)return;window.__testpilotInstalled=true;const send=window['__BINDING__'];if(typeof send!=='function')return;const clip=(s)=>{s=(s||'').replace(/\s+/g,' ').trim();return s.length>120?s.slice(0,120):s};const implicitRole=(el)=>{const tag=el.tagName.toLowerCase();if(tag==='a'&&el.hasAttribute('href'))return 'link';if(tag==='button')return 'button';if(tag==='select')return 'combobox';if(tag==='textarea')return 'textbox';if(tag==='input'){const t=(el.getAttribute('type')||'text').toLowerCase();if(t==='checkbox')return 'checkbox';if(t==='radio')return 'radio';if(t==='submit'||t==='button'||t==='reset')return 'button';return 'textbox'}return ''};const cssPath=(el)=>{if(el.id)return '#'+CSS.escape(el.id);const parts=[];let node=el;while(node&&node.nodeType===1&&parts.length<4){let part=node.tagName.toLowerCase();const parent=node.parentElement;if(parent){const same=Array.from(parent.children).filter(c=>c.tagName===node.tagName);if(same.length>1)part+=':nth-of-type('+(same.indexOf(node)+1)+')'}parts.unshift(part);if(node.id){parts[0]='#'+CSS.escape(node.id);break}node=parent}return parts.join(' > ')};document.addEventListener('click',(e)=>{const el=e.target&&e.target.closest?e.target.closest('a,button,input,select,textarea,[role],[data-testid]')||e.target:null;if(!el||!el.tagName)return;const role=el.getAttribute('role')||implicitRole(el);const name=clip(el.getAttribute('aria-label')||el.innerText||el.value||'');const target={css:cssPath(el)};if(role&&name)target.aria=[role,name];const testid=el.getAttribute('data-testid');if(testid)target.testid=testid;const text=clip(el.innerText);if(text)target.text=text;try{send(JSON.stringify({action:el.tagName.toLowerCase(),timestamp:Date.now(),target:target}))}catch(_){}},true)})()"#;

/// Recorder script wired to the runtime binding `binding_name`.
pub fn recorder_script(binding_name: &str) -> String {
    RECORDER_SCRIPT.replace(BINDING_PLACEHOLDER, &escape_selector(binding_name))
}

pub fn escape_selector(selector: &str) -> String {
    selector.replace('\\', "\\\\").replace('\'', "\\'")
}
