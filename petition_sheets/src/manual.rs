/*!

This is the long-form manual for `petition_sheets` and the `petdesk` command line.

## Sheets and rows

A petition sheet is a printed form with 12 signature lines. Each recorded signature sits on
one line (a *row*), numbered from 1 at the top to 12 at the bottom. The server keeps the rows
already recorded for every sheet.

## Proposing a row

When a signature is about to be recorded, the rows taken on the sheet are fetched fresh from
the server and a row is proposed:

1. an empty sheet starts at row 1;
2. otherwise the rows after the highest recorded row are tried, top to bottom;
3. if there are none left, the sheet is scanned again from row 1 to fill the gaps;
4. if the sheet is full, row 1 is proposed anyway and the sheet is reported as full.

For example, with rows `1` and `5` taken the proposal is `6`, not `2`: operators usually fill
a sheet top to bottom, and gaps are left for corrections. With `10`, `11` and `12` taken the
proposal is `1`.

If the sheet number is missing or the server cannot answer, row 1 is proposed. The proposal
is only a default: the operator may always pick another row.

```bash
petdesk allocate --occupied 1,2,3
petdesk --server http://localhost:5000 next-row --sheet 1042
```

## Recording signatures

* `match` records a signature that was found in the voter file (by voter id).
* `not-found` records a signature that could not be matched, with what can be read from the sheet.

Both take the sheet number, an optional row (proposed as above when left out), the collection
date as month / day / year (defaults to the first of the current month) and the optional last
four digits of the signer's SSN.

## Workflow

| Status        | Reached with                                   |
|---------------|------------------------------------------------|
| `Printed`     | sheet creation (server side)                   |
| `Signing`     | `sheet-status --to signing`                    |
| `Summarizing` | `sheet-status --to summarizing`                |
| `Closed`      | `close-sheet` with notary and circulator       |
| `Pre-shipment`| `add-to-batch`, then `close-batch`             |
| `Shipped`     | `ship-batch` with carrier and tracking number  |

Only one batch is built at a time. Closing it freezes its list of sheets, shipping it ships
all of them.

## Configuration

`petdesk` reads an optional JSON file given with `--config`:

```json
{
  "serverUrl": "http://localhost:5000",
  "connectTimeoutSeconds": 5,
  "timeoutSeconds": 30,
  "matchedGoal": 1000
}
```

Numbers may also be written as strings. `--server` overrides `serverUrl`.

*/
