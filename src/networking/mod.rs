/*!

# Networking Interfaces and Methods

## Introduction

A node exposes a small JSON REST interface for bootstrapping and one websocket for streaming
chat generations back to its client.

## REST

```text
POST /go-online          -> { "success": true, "node_id": "1a2b3c4d", "status": "online" }
POST /connect-to-swarm   { "ip": "192.168.0.111" }
                         -> { "success": true, "connected_to": "192.168.0.111", "peers": [..] }
                         -> { "success": false, "error": "Peer not reachable" }
GET  /status             -> { "node_id": .., "online": .., "connected_server": .., "peers": [..] }
```

Joining a swarm probes the target's layer port over TCP before it is accepted.

## Chat

`GET /chat` upgrades to a websocket. The client sends one text frame per prompt:

```json
{ "prompt": "Why is the sky blue?" }
```

and the node answers with a stream of frames. With the default **legacy** framing every frame is
raw text appended to the answer, and the literal `__DONE__` ends the generation. Errors are sent
as `[ERROR] <message>` followed by `__DONE__`.

Connecting to `/chat?framing=envelope` switches to tagged frames:

```json
{ "type": "token", "text": "Hel" }
{ "type": "done" }
{ "type": "error", "message": "Not connected to swarm" }
```

Only one prompt is served at a time per socket. A prompt sent while a generation is still
streaming is dropped.

*/

pub mod api_message;
pub mod filters;
pub mod handlers;
pub mod probe;
pub mod signals;
pub mod socket;
